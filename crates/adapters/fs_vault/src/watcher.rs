//! Vault watcher: turns notify events into [`FormFileEvent`]s.

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use formgate_domain::event::FormFileEvent;
use formgate_domain::form::is_form_path;

use crate::error::VaultError;
use crate::vault::relative_path;

/// Keeps a recursive watch on the vault alive; dropping it stops the watch.
pub struct FormWatcher {
    _watcher: RecommendedWatcher,
}

impl FormWatcher {
    /// Watch `root` recursively, sending form file changes to `events`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Watch`] when the platform watcher cannot start.
    pub fn spawn(root: &Path, events: mpsc::Sender<FormFileEvent>) -> Result<Self, VaultError> {
        let root = root
            .canonicalize()
            .map_err(|err| VaultError::io(&root.display().to_string(), err))?;
        let callback_root = root.clone();
        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    for change in translate(&callback_root, &event) {
                        if events.blocking_send(change).is_err() {
                            tracing::debug!("form event receiver closed");
                            return;
                        }
                    }
                }
                Err(err) => tracing::warn!(%err, "vault watch error"),
            }
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;
        tracing::info!(root = %root.display(), "watching vault for form changes");
        Ok(Self { _watcher: watcher })
    }
}

/// Map one notify event to the form events it implies.
///
/// Paths outside `root` and files that are not forms are dropped, except
/// that a rename between a form and a non-form path is reported as the
/// matching creation or deletion.
#[must_use]
pub fn translate(root: &Path, event: &Event) -> Vec<FormFileEvent> {
    let relative = |path: &PathBuf| relative_path(root, path);
    let forms = || {
        event
            .paths
            .iter()
            .filter_map(relative)
            .filter(|p| is_form_path(p))
    };

    match event.kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            forms().map(FormFileEvent::Created).collect()
        }
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            forms().map(FormFileEvent::Deleted).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let [from, to] = event.paths.as_slice() else {
                return Vec::new();
            };
            match (relative(from), relative(to)) {
                (Some(from), Some(to)) => match (is_form_path(&from), is_form_path(&to)) {
                    (true, _) => vec![FormFileEvent::Renamed { from, to }],
                    (false, true) => vec![FormFileEvent::Created(to)],
                    (false, false) => Vec::new(),
                },
                (Some(from), None) if is_form_path(&from) => vec![FormFileEvent::Deleted(from)],
                (None, Some(to)) if is_form_path(&to) => vec![FormFileEvent::Created(to)],
                _ => Vec::new(),
            }
        }
        EventKind::Modify(_) => forms().map(FormFileEvent::Modified).collect(),
        _ => Vec::new(),
    }
}
