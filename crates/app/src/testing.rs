//! In-memory port implementations shared by the unit tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::sync::Mutex;

use serde_json::{Map, Value};

use formgate_domain::error::FormGateError;
use formgate_domain::form::{FormConfig, LAST_EXECUTION_TIME_KEY};

use crate::ports::{DocumentStore, EditorWorkspace, FormRepository};

#[derive(Debug)]
struct StubError(String);

impl std::fmt::Display for StubError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for StubError {}

fn storage_error(message: &str) -> FormGateError {
    FormGateError::Storage(Box::new(StubError(message.to_string())))
}

/// Documents, forms and editor state held in memory.
#[derive(Default)]
pub struct MemoryVault {
    notes: Mutex<HashMap<String, (String, Map<String, Value>)>>,
    failing_reads: Mutex<HashSet<String>>,
    forms: Mutex<BTreeMap<String, Value>>,
    fail_patches: Mutex<bool>,
    patches: Mutex<Vec<(String, i64)>>,
    open: Mutex<Vec<String>>,
    active: Mutex<Option<String>>,
}

impl MemoryVault {
    pub fn put_note(&self, path: &str, text: &str, front_matter: Value) {
        let properties = match front_matter {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.notes
            .lock()
            .unwrap()
            .insert(path.to_string(), (text.to_string(), properties));
    }

    pub fn fail_reads(&self, path: &str) {
        self.failing_reads.lock().unwrap().insert(path.to_string());
    }

    pub fn put_form(&self, path: &str, form: Value) {
        self.forms.lock().unwrap().insert(path.to_string(), form);
    }

    pub fn remove_form(&self, path: &str) {
        self.forms.lock().unwrap().remove(path);
    }

    pub fn raw_form(&self, path: &str) -> Option<Value> {
        self.forms.lock().unwrap().get(path).cloned()
    }

    pub fn fail_patches(&self) {
        *self.fail_patches.lock().unwrap() = true;
    }

    pub fn patches(&self) -> Vec<(String, i64)> {
        self.patches.lock().unwrap().clone()
    }
}

impl DocumentStore for MemoryVault {
    fn exists(&self, path: &str) -> impl Future<Output = Result<bool, FormGateError>> + Send {
        let exists = self.notes.lock().unwrap().contains_key(path);
        async move { Ok(exists) }
    }

    fn read_text(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Option<String>, FormGateError>> + Send {
        let result = if self.failing_reads.lock().unwrap().contains(path) {
            Err(storage_error("read failed"))
        } else {
            Ok(self.notes.lock().unwrap().get(path).map(|(text, _)| text.clone()))
        };
        async move { result }
    }

    fn read_front_matter(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Option<Map<String, Value>>, FormGateError>> + Send {
        let result = self.notes.lock().unwrap().get(path).map(|(_, fm)| fm.clone());
        async move { Ok(result) }
    }
}

impl EditorWorkspace for MemoryVault {
    fn open_files(&self) -> impl Future<Output = Vec<String>> + Send {
        let open = self.open.lock().unwrap().clone();
        async move { open }
    }

    fn active_file(&self) -> impl Future<Output = Option<String>> + Send {
        let active = self.active.lock().unwrap().clone();
        async move { active }
    }

    fn set_open_files(
        &self,
        open: Vec<String>,
        active: Option<String>,
    ) -> impl Future<Output = ()> + Send {
        *self.open.lock().unwrap() = open;
        *self.active.lock().unwrap() = active;
        async {}
    }
}

impl FormRepository for MemoryVault {
    fn list_forms(&self) -> impl Future<Output = Result<Vec<String>, FormGateError>> + Send {
        let paths = self.forms.lock().unwrap().keys().cloned().collect();
        async move { Ok(paths) }
    }

    fn load(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Option<FormConfig>, FormGateError>> + Send {
        let result = match self.forms.lock().unwrap().get(path) {
            Some(raw) => FormConfig::from_json(&raw.to_string()).map(Some),
            None => Ok(None),
        };
        async move { result }
    }

    fn patch_last_execution_time(
        &self,
        path: &str,
        millis: i64,
    ) -> impl Future<Output = Result<(), FormGateError>> + Send {
        let result = if *self.fail_patches.lock().unwrap() {
            Err(storage_error("disk full"))
        } else {
            self.patches.lock().unwrap().push((path.to_string(), millis));
            if let Some(Value::Object(raw)) = self.forms.lock().unwrap().get_mut(path) {
                raw.insert(LAST_EXECUTION_TIME_KEY.to_string(), Value::from(millis));
            }
            Ok(())
        };
        async move { result }
    }
}
