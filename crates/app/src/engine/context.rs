//! Evaluation context: everything a leaf may observe while it is evaluated.

use serde_json::{Map, Value};

use formgate_domain::form::FormConfig;
use formgate_domain::time::{self, Timestamp};

use crate::ports::EditorWorkspace;

/// Versions reported to `system` leaves and scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub host_version: String,
    pub plugin_version: String,
}

impl Default for HostInfo {
    fn default() -> Self {
        Self {
            host_version: "0.0.0".to_string(),
            plugin_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Snapshot of the world handed to the condition engine.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    pub now: Timestamp,
    pub active_file: Option<String>,
    pub form_file_path: Option<String>,
    /// Epoch milliseconds of the previous fire.
    pub last_execution_time: Option<i64>,
    pub host_version: String,
    pub plugin_version: String,
    pub form: Option<FormConfig>,
    /// Runtime field values keyed by field id or label.
    pub values: Map<String, Value>,
}

impl EvaluationContext {
    /// Context at `now` with no form attached.
    #[must_use]
    pub fn new(host: &HostInfo, now: Timestamp) -> Self {
        Self {
            now,
            active_file: None,
            form_file_path: None,
            last_execution_time: None,
            host_version: host.host_version.clone(),
            plugin_version: host.plugin_version.clone(),
            form: None,
            values: Map::new(),
        }
    }

    /// Context at `now` carrying the active document of `workspace`.
    pub async fn capture<W: EditorWorkspace>(
        workspace: &W,
        host: &HostInfo,
        now: Timestamp,
    ) -> Self {
        let mut ctx = Self::new(host, now);
        ctx.active_file = workspace.active_file().await;
        ctx
    }

    /// Attach the form stored at `path`, taking its last execution time.
    #[must_use]
    pub fn with_form(mut self, path: impl Into<String>, form: FormConfig) -> Self {
        self.form_file_path = Some(path.into());
        self.last_execution_time = form.last_execution_time;
        self.form = Some(form);
        self
    }

    #[must_use]
    pub fn with_values(mut self, values: Map<String, Value>) -> Self {
        self.values = values;
        self
    }

    #[must_use]
    pub fn with_active_file(mut self, path: Option<String>) -> Self {
        self.active_file = path;
        self
    }

    #[must_use]
    pub fn with_last_execution_time(mut self, millis: Option<i64>) -> Self {
        self.last_execution_time = millis;
        self
    }

    /// Current value of a form field by label or id, falling back to its default.
    #[must_use]
    pub fn field_value(&self, key: &str) -> Option<Value> {
        match &self.form {
            Some(form) => form.resolve_field_value(key, &self.values),
            None => self.values.get(key).cloned(),
        }
    }

    /// `now` as epoch milliseconds.
    #[must_use]
    pub fn now_millis(&self) -> i64 {
        self.now.timestamp_millis()
    }
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new(&HostInfo::default(), time::now())
    }
}
