//! Vault-specific error type wrapping IO, JSON and watcher errors.

use formgate_domain::error::FormGateError;

/// Errors originating from the filesystem vault.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// The vault root is missing or not a directory.
    #[error("vault root {0} is not a directory")]
    InvalidRoot(String),

    /// A path points outside the vault.
    #[error("path escapes the vault: {0}")]
    OutsideVault(String),

    /// Reading or writing a file failed.
    #[error("io error on {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A form file is valid JSON but not an object.
    #[error("form {0} is not a JSON object")]
    NotAnObject(String),

    /// Failed to (de)serialize a form document.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    /// The file watcher could not be set up.
    #[error("watch error")]
    Watch(#[from] notify::Error),
}

impl VaultError {
    pub(crate) fn io(path: &str, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_string(),
            source,
        }
    }
}

impl From<VaultError> for FormGateError {
    fn from(err: VaultError) -> Self {
        Self::Storage(Box::new(err))
    }
}
