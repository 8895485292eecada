//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use formgate_app::ports::{ActionRunner, EditorWorkspace, FormRepository};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests API routes under `/api` and includes a [`TraceLayer`] that logs each
/// HTTP request/response at the `DEBUG` level.
pub fn build<R, W, A>(state: AppState<R, W, A>) -> Router
where
    R: FormRepository + Send + Sync + 'static,
    W: EditorWorkspace + Send + Sync + 'static,
    A: ActionRunner + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{Map, Value, json};
    use tower::ServiceExt;

    use formgate_app::engine::{ConditionEngine, EvaluationContext, HostInfo};
    use formgate_app::ports::{DocumentStore, ScriptError, ScriptHost};
    use formgate_app::scheduler::{AutoTriggerScheduler, SchedulerConfig};
    use formgate_app::services::FormService;
    use formgate_app::templates::BuiltinTemplates;
    use formgate_domain::error::{FormGateError, ValidationError};
    use formgate_domain::form::FormConfig;

    #[derive(Default)]
    struct StubVault {
        forms: Mutex<BTreeMap<String, FormConfig>>,
        open: Mutex<Vec<String>>,
        active: Mutex<Option<String>>,
    }

    impl FormRepository for StubVault {
        async fn list_forms(&self) -> Result<Vec<String>, FormGateError> {
            Ok(self.forms.lock().unwrap().keys().cloned().collect())
        }
        async fn load(&self, path: &str) -> Result<Option<FormConfig>, FormGateError> {
            if path.ends_with("broken.form.json") {
                return Err(ValidationError::MalformedForm("trailing comma at line 4".to_string()).into());
            }
            Ok(self.forms.lock().unwrap().get(path).cloned())
        }
        async fn patch_last_execution_time(
            &self,
            path: &str,
            millis: i64,
        ) -> Result<(), FormGateError> {
            if let Some(form) = self.forms.lock().unwrap().get_mut(path) {
                form.last_execution_time = Some(millis);
            }
            Ok(())
        }
    }

    impl EditorWorkspace for StubVault {
        async fn open_files(&self) -> Vec<String> {
            self.open.lock().unwrap().clone()
        }
        async fn active_file(&self) -> Option<String> {
            self.active.lock().unwrap().clone()
        }
        async fn set_open_files(&self, open: Vec<String>, active: Option<String>) {
            *self.open.lock().unwrap() = open;
            *self.active.lock().unwrap() = active;
        }
    }

    impl DocumentStore for StubVault {
        async fn exists(&self, _path: &str) -> Result<bool, FormGateError> {
            Ok(false)
        }
        async fn read_text(&self, _path: &str) -> Result<Option<String>, FormGateError> {
            Ok(None)
        }
        async fn read_front_matter(
            &self,
            _path: &str,
        ) -> Result<Option<Map<String, Value>>, FormGateError> {
            Ok(None)
        }
    }

    struct StubRunner;

    impl ActionRunner for StubRunner {
        async fn run(&self, _form: &FormConfig, _ctx: &EvaluationContext) -> Result<(), FormGateError> {
            Ok(())
        }
    }

    /// Host understanding only the literals `true` and `false`.
    struct LiteralHost;

    impl ScriptHost for LiteralHost {
        fn evaluate(&self, expression: &str, _: &Map<String, Value>) -> Result<Value, ScriptError> {
            match expression {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                other => Err(ScriptError::Runtime(format!("{other} is not defined"))),
            }
        }
    }

    type TestState = AppState<Arc<StubVault>, Arc<StubVault>, Arc<StubRunner>>;

    fn test_state() -> (TestState, Arc<StubVault>) {
        let vault = Arc::new(StubVault::default());
        let runner = Arc::new(StubRunner);
        let scripts: Arc<dyn ScriptHost> = Arc::new(LiteralHost);
        let engine = Arc::new(ConditionEngine::with_default_evaluators(
            vault.clone(),
            scripts.clone(),
            Arc::new(BuiltinTemplates),
        ));
        let service = FormService::new(
            engine.clone(),
            vault.clone(),
            vault.clone(),
            runner.clone(),
            scripts,
            HostInfo::default(),
        );
        let scheduler = AutoTriggerScheduler::new(
            engine,
            vault.clone(),
            vault.clone(),
            runner,
            HostInfo::default(),
            SchedulerConfig::default(),
        );
        (
            AppState::new(Arc::new(service), Arc::new(scheduler)),
            vault,
        )
    }

    fn put_form(vault: &StubVault, path: &str, expression: &str) {
        let form: FormConfig = serde_json::from_value(json!({
            "id": "daily",
            "name": "Daily note",
            "fields": [
                {"id": "mood", "label": "Mood"},
                {"id": "hidden", "label": "Hidden", "visibleWhen": {"type": "script", "expression": "false"}}
            ],
            "autoTrigger": {"enabled": true},
            "startupConditions": {
                "kind": "group",
                "children": [
                    {"id": "guard", "kind": "script", "config": {"expression": expression}},
                    {"kind": "script", "category": "autoTrigger", "config": {"expression": "true"}}
                ]
            }
        }))
        .unwrap();
        vault.forms.lock().unwrap().insert(path.to_string(), form);
    }

    fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let (state, _) = test_state();
        let response = build(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_list_registered_units() {
        let (state, vault) = test_state();
        put_form(&vault, "forms/daily.form.json", "true");
        state.scheduler.load_all().await.unwrap();

        let response = build(state)
            .oneshot(Request::builder().uri("/api/units").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body[0]["filePath"], "forms/daily.form.json");
        assert_eq!(body[0]["isRunning"], false);
    }

    #[tokio::test]
    async fn should_evaluate_ad_hoc_conditions() {
        let (state, _) = test_state();
        let request = json_request(
            Method::POST,
            "/api/conditions/evaluate",
            &json!({
                "conditions": {
                    "kind": "group",
                    "relation": "or",
                    "children": [
                        {"kind": "script", "config": {"expression": "false"}},
                        {"kind": "script", "config": {"expression": "true"}}
                    ]
                }
            }),
        );

        let response = build(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["satisfied"], true);
        assert_eq!(body["childResults"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn should_return_not_found_when_previewing_missing_form() {
        let (state, _) = test_state();
        let request = json_request(
            Method::POST,
            "/api/forms/preview",
            &json!({"formPath": "forms/none.form.json"}),
        );

        let response = build(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Form not found: forms/none.form.json");
    }

    #[tokio::test]
    async fn should_reject_empty_form_path() {
        let (state, _) = test_state();
        let request = json_request(Method::POST, "/api/forms/run", &json!({"formPath": ""}));

        let response = build(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], "empty_path");
    }

    #[tokio::test]
    async fn should_report_malformed_form_as_unprocessable() {
        let (state, _) = test_state();
        let request = json_request(
            Method::POST,
            "/api/forms/preview",
            &json!({"formPath": "forms/broken.form.json"}),
        );

        let response = build(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["code"], "malformed_form");
        assert!(body["error"].as_str().unwrap().contains("trailing comma at line 4"));
    }

    #[tokio::test]
    async fn should_return_conflict_with_explanation_when_run_is_blocked() {
        let (state, vault) = test_state();
        put_form(&vault, "forms/daily.form.json", "nope");
        let request = json_request(
            Method::POST,
            "/api/forms/run",
            &json!({"formPath": "forms/daily.form.json"}),
        );

        let response = build(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["executed"], false);
        assert_eq!(body["satisfied"], false);
        assert!(
            body["explanation"]
                .as_str()
                .unwrap()
                .contains("nope is not defined")
        );
        assert!(vault.forms.lock().unwrap()["forms/daily.form.json"].last_execution_time.is_none());
    }

    #[tokio::test]
    async fn should_run_and_persist_when_gate_holds() {
        let (state, vault) = test_state();
        put_form(&vault, "forms/daily.form.json", "true");
        let request = json_request(
            Method::POST,
            "/api/forms/run",
            &json!({"formPath": "forms/daily.form.json"}),
        );

        let response = build(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["executed"], true);
        let fired_at = body["firedAt"].as_i64().unwrap();
        assert_eq!(
            vault.forms.lock().unwrap()["forms/daily.form.json"].last_execution_time,
            Some(fired_at)
        );
    }

    #[tokio::test]
    async fn should_report_field_visibility() {
        let (state, vault) = test_state();
        put_form(&vault, "forms/daily.form.json", "true");
        let request = json_request(
            Method::POST,
            "/api/forms/visibility",
            &json!({"formPath": "forms/daily.form.json", "values": {"mood": "calm"}}),
        );

        let response = build(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"hidden": false, "mood": true})
        );
    }

    #[tokio::test]
    async fn should_store_reported_workspace() {
        let (state, vault) = test_state();
        let request = json_request(
            Method::PUT,
            "/api/workspace",
            &json!({"openFiles": ["a.md", "b.md"], "activeFile": "b.md"}),
        );

        let response = build(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(vault.open.lock().unwrap().len(), 2);
        assert_eq!(vault.active.lock().unwrap().as_deref(), Some("b.md"));
    }
}
