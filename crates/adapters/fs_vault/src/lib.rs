//! # formgate-adapter-fs-vault
//!
//! Filesystem adapter: a vault is a directory of markdown notes and
//! `*.form.json` form configurations.
//!
//! ## Responsibilities
//! - Implement `DocumentStore`, `EditorWorkspace` and `FormRepository`
//!   defined in `formgate-app::ports`
//! - Parse note front-matter into JSON properties
//! - Patch `lastExecutionTime` in place without disturbing other keys
//! - Watch the vault with [notify](https://docs.rs/notify) and translate
//!   changes into `FormFileEvent`s
//!
//! ## Dependency rule
//! Depends on `formgate-app` (for port traits) and `formgate-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod frontmatter;
pub mod vault;
pub mod watcher;

pub use error::VaultError;
pub use vault::{Config, FsVault};
pub use watcher::FormWatcher;
