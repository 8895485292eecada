//! Filesystem vault implementing the document, workspace and form ports.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock};

use formgate_app::ports::{DocumentStore, EditorWorkspace, FormRepository};
use formgate_domain::error::{FormGateError, ValidationError};
use formgate_domain::form::{FormConfig, LAST_EXECUTION_TIME_KEY, is_form_path};

use crate::error::VaultError;
use crate::frontmatter;

/// Configuration for the filesystem vault adapter.
pub struct Config {
    /// Directory holding notes and form files.
    pub root: PathBuf,
}

impl Config {
    /// Open the vault described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidRoot`] when the root is not a directory.
    pub async fn build(self) -> Result<FsVault, VaultError> {
        FsVault::open(self.root).await
    }
}

#[derive(Debug, Default)]
struct WorkspaceState {
    open: Vec<String>,
    active: Option<String>,
}

/// A vault rooted at a directory.
///
/// Paths handed to the ports are vault-relative with `/` separators.
pub struct FsVault {
    root: PathBuf,
    workspace: RwLock<WorkspaceState>,
    writes: Mutex<()>,
}

impl FsVault {
    /// Open an existing directory as a vault.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidRoot`] when `root` is not a directory.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, VaultError> {
        let root = root.into();
        let display = root.display().to_string();
        let root = tokio::fs::canonicalize(&root)
            .await
            .map_err(|_| VaultError::InvalidRoot(display.clone()))?;
        let is_dir = tokio::fs::metadata(&root)
            .await
            .is_ok_and(|meta| meta.is_dir());
        if !is_dir {
            return Err(VaultError::InvalidRoot(display));
        }
        tracing::debug!(root = %root.display(), "vault opened");
        Ok(Self {
            root,
            workspace: RwLock::new(WorkspaceState::default()),
            writes: Mutex::new(()),
        })
    }

    /// Canonical root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a vault-relative path, refusing anything that escapes the root.
    fn resolve(&self, path: &str) -> Result<PathBuf, VaultError> {
        let relative = Path::new(path.trim_start_matches('/'));
        if path.trim().is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(VaultError::OutsideVault(path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    async fn read_optional(&self, path: &str) -> Result<Option<String>, VaultError> {
        let full = self.resolve(path)?;
        match tokio::fs::read_to_string(&full).await {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(VaultError::io(path, err)),
        }
    }

    async fn write_atomically(&self, path: &str, contents: String) -> Result<(), VaultError> {
        let full = self.resolve(path)?;
        let mut tmp = full.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|err| VaultError::io(path, err))?;
        tokio::fs::rename(&tmp, &full)
            .await
            .map_err(|err| VaultError::io(path, err))
    }

    async fn collect_forms(&self) -> Result<Vec<String>, VaultError> {
        let mut forms = Vec::new();
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|err| VaultError::io(&dir.display().to_string(), err))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|err| VaultError::io(&dir.display().to_string(), err))?
            {
                let name = entry.file_name();
                if name.to_string_lossy().starts_with('.') {
                    continue;
                }
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|err| VaultError::io(&name.to_string_lossy(), err))?;
                let path = entry.path();
                if file_type.is_dir() {
                    pending.push(path);
                } else if let Some(relative) = relative_path(&self.root, &path)
                    && is_form_path(&relative)
                {
                    forms.push(relative);
                }
            }
        }
        forms.sort();
        Ok(forms)
    }
}

/// Vault-relative `/`-separated form of `path`, if it lies under `root`.
#[must_use]
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Option<_>>()?;
    (!parts.is_empty()).then(|| parts.join("/"))
}

impl DocumentStore for FsVault {
    async fn exists(&self, path: &str) -> Result<bool, FormGateError> {
        let full = self.resolve(path)?;
        match tokio::fs::metadata(&full).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(VaultError::io(path, err).into()),
        }
    }

    async fn read_text(&self, path: &str) -> Result<Option<String>, FormGateError> {
        Ok(self.read_optional(path).await?)
    }

    async fn read_front_matter(
        &self,
        path: &str,
    ) -> Result<Option<Map<String, Value>>, FormGateError> {
        let text = self.read_optional(path).await?;
        Ok(text.as_deref().map(frontmatter::parse))
    }
}

impl EditorWorkspace for FsVault {
    async fn open_files(&self) -> Vec<String> {
        self.workspace.read().await.open.clone()
    }

    async fn active_file(&self) -> Option<String> {
        self.workspace.read().await.active.clone()
    }

    async fn set_open_files(&self, open: Vec<String>, active: Option<String>) {
        let mut state = self.workspace.write().await;
        tracing::debug!(open = open.len(), ?active, "workspace views updated");
        state.open = open;
        state.active = active;
    }
}

impl FormRepository for FsVault {
    async fn list_forms(&self) -> Result<Vec<String>, FormGateError> {
        Ok(self.collect_forms().await?)
    }

    async fn load(&self, path: &str) -> Result<Option<FormConfig>, FormGateError> {
        match self.read_optional(path).await? {
            Some(text) => FormConfig::from_json(&text).map(Some),
            None => Ok(None),
        }
    }

    async fn patch_last_execution_time(&self, path: &str, millis: i64) -> Result<(), FormGateError> {
        let _guard = self.writes.lock().await;
        let text = self.read_optional(path).await?.ok_or_else(|| {
            VaultError::io(path, std::io::Error::from(ErrorKind::NotFound))
        })?;
        let mut document: Value = serde_json::from_str(&text)
            .map_err(|err| ValidationError::MalformedForm(err.to_string()))?;
        let Value::Object(fields) = &mut document else {
            return Err(VaultError::NotAnObject(path.to_string()).into());
        };
        fields.insert(LAST_EXECUTION_TIME_KEY.to_string(), Value::from(millis));

        let mut contents = serde_json::to_string_pretty(&document).map_err(VaultError::from)?;
        contents.push('\n');
        self.write_atomically(path, contents).await?;
        tracing::debug!(path, millis, "last execution time persisted");
        Ok(())
    }
}
