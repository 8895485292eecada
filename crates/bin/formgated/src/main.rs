//! # formgated: formgate daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Open the filesystem vault and start the form file watcher
//! - Construct the condition engine with its default leaf evaluators
//! - Construct the auto-trigger scheduler and the form service
//! - Build the axum router, bind to a TCP port and serve
//! - Handle graceful shutdown (Ctrl-C) for both the server and the scheduler
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;
mod runner;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

use formgate_adapter_fs_vault::FormWatcher;
use formgate_adapter_http_axum::router;
use formgate_adapter_http_axum::state::AppState;
use formgate_adapter_script_expr::ExpressionHost;
use formgate_app::engine::ConditionEngine;
use formgate_app::engine::evaluators::ScriptEvaluator;
use formgate_app::ports::{ScriptHost, TemplateExpander};
use formgate_app::scheduler::AutoTriggerScheduler;
use formgate_app::services::FormService;
use formgate_app::templates::BuiltinTemplates;
use formgate_domain::condition::ConditionKind;

use crate::config::Config;
use crate::runner::LoggingActionRunner;

const EVENT_BUFFER: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Vault
    let vault = Arc::new(
        formgate_adapter_fs_vault::Config {
            root: config.vault.root.clone(),
        }
        .build()
        .await?,
    );

    // Engine
    let scripts: Arc<dyn ScriptHost> = Arc::new(ExpressionHost::new(config.scripts.max_depth));
    let templates: Arc<dyn TemplateExpander> = Arc::new(BuiltinTemplates);
    let engine = Arc::new(ConditionEngine::with_default_evaluators(
        Arc::clone(&vault),
        Arc::clone(&scripts),
        templates,
    ));
    engine.register_evaluator(
        ConditionKind::Script,
        Arc::new(ScriptEvaluator::new(Arc::clone(&scripts)).with_timeout(config.script_timeout())),
    );

    // Services
    let host = config.host_info();
    let runner = Arc::new(LoggingActionRunner);
    let scheduler = Arc::new(AutoTriggerScheduler::new(
        Arc::clone(&engine),
        Arc::clone(&vault),
        Arc::clone(&vault),
        Arc::clone(&runner),
        host.clone(),
        config.scheduler_config(),
    ));
    let form_service = Arc::new(FormService::new(
        engine,
        Arc::clone(&vault),
        Arc::clone(&vault),
        runner,
        scripts,
        host,
    )
    .with_script_timeout(config.script_timeout()));

    // Scheduler & watcher
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
    let (watcher, scheduler_task) = if config.scheduler.enabled {
        let watcher = FormWatcher::spawn(vault.root(), events_tx)?;
        let task = tokio::spawn(Arc::clone(&scheduler).run(events_rx, shutdown_rx));
        (Some(watcher), Some(task))
    } else {
        tracing::info!("auto-trigger scheduler disabled");
        (None, None)
    };

    // HTTP
    let app = router::build(AppState::new(form_service, scheduler));
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        addr = %bind_addr,
        vault = %vault.root().display(),
        "formgated listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    drop(watcher);
    if let Some(task) = scheduler_task {
        task.await?;
    }
    tracing::info!("formgated stopped");
    Ok(())
}

/// Resolve on Ctrl-C and tell background tasks to stop.
async fn shutdown_signal(shutdown: watch::Sender<bool>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "cannot listen for shutdown signal");
    }
    tracing::info!("shutdown requested");
    // The scheduler may already be gone.
    let _ = shutdown.send(true);
}
