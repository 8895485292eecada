//! File events: changes to form configuration files seen by the watcher.

use std::fmt;

/// A change to a vault file, with vault-relative `/`-separated paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormFileEvent {
    Created(String),
    Modified(String),
    Renamed { from: String, to: String },
    Deleted(String),
}

impl fmt::Display for FormFileEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created(path) => write!(f, "created({path})"),
            Self::Modified(path) => write!(f, "modified({path})"),
            Self::Renamed { from, to } => write!(f, "renamed({from} -> {to})"),
            Self::Deleted(path) => write!(f, "deleted({path})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_events() {
        let e = FormFileEvent::Renamed {
            from: "a.form.json".to_string(),
            to: "b.form.json".to_string(),
        };
        assert_eq!(e.to_string(), "renamed(a.form.json -> b.form.json)");
        assert_eq!(
            FormFileEvent::Deleted("a.form.json".to_string()).to_string(),
            "deleted(a.form.json)"
        );
    }
}
