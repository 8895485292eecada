//! Auto-trigger scheduler: periodically fires forms whose gate holds.
//!
//! The scheduler owns a registry of monitored forms keyed by path. File
//! events keep it current; every tick visits the idle units in path order,
//! skips those inside their cooldown, evaluates the gate twice under the
//! auto-trigger category and fires when both checks hold.
//!
//! A unit's `is_running` flag is claimed under the registry lock before the
//! action runner is awaited and released afterwards whatever happened, so an
//! overlapping tick never fires the same unit twice. The lock is never held
//! across an `.await`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};

use formgate_domain::condition::ConditionCategory;
use formgate_domain::error::FormGateError;
use formgate_domain::event::FormFileEvent;
use formgate_domain::form::{FormConfig, is_form_path};
use formgate_domain::time::{self, Timestamp};

use crate::engine::{ConditionEngine, EvaluationContext, HostInfo};
use crate::ports::{ActionRunner, EditorWorkspace, FormRepository};

/// Timing knobs of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Period between two ticks.
    pub tick_interval: Duration,
    /// Delay before the first tick so the workspace can settle.
    pub initial_delay: Duration,
    /// Minimum time between two fires of one form.
    pub min_cooldown: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(60),
            initial_delay: Duration::from_secs(5),
            min_cooldown: Duration::from_secs(60),
        }
    }
}

/// Registry entry for one auto-triggered form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoredUnit {
    pub file_path: String,
    pub config: FormConfig,
    pub is_running: bool,
}

/// Periodic evaluator and firer of auto-triggered forms.
pub struct AutoTriggerScheduler<R, W, A> {
    engine: Arc<ConditionEngine>,
    forms: R,
    workspace: W,
    runner: A,
    host: HostInfo,
    config: SchedulerConfig,
    units: Mutex<BTreeMap<String, MonitoredUnit>>,
}

impl<R, W, A> AutoTriggerScheduler<R, W, A>
where
    R: FormRepository + Send + Sync,
    W: EditorWorkspace + Send + Sync,
    A: ActionRunner + Send + Sync,
{
    /// Create a scheduler with an empty registry.
    pub fn new(
        engine: Arc<ConditionEngine>,
        forms: R,
        workspace: W,
        runner: A,
        host: HostInfo,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            engine,
            forms,
            workspace,
            runner,
            host,
            config,
            units: Mutex::new(BTreeMap::new()),
        }
    }

    fn registry(&self) -> MutexGuard<'_, BTreeMap<String, MonitoredUnit>> {
        self.units.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the registry in path order.
    pub fn units(&self) -> Vec<MonitoredUnit> {
        self.registry().values().cloned().collect()
    }

    /// Register every qualifying form found in the repository.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the forms cannot be listed.
    #[tracing::instrument(skip(self))]
    pub async fn load_all(&self) -> Result<usize, FormGateError> {
        for path in self.forms.list_forms().await? {
            self.refresh(&path).await;
        }
        let count = self.registry().len();
        tracing::info!(count, "auto-trigger registry loaded");
        Ok(count)
    }

    /// Apply a file event to the registry.
    pub async fn handle_event(&self, event: FormFileEvent) {
        tracing::debug!(%event, "form file event");
        match event {
            FormFileEvent::Created(path) | FormFileEvent::Modified(path) => {
                if is_form_path(&path) {
                    self.refresh(&path).await;
                }
            }
            FormFileEvent::Renamed { from, to } => {
                self.unregister(&from);
                if is_form_path(&to) {
                    self.refresh(&to).await;
                }
            }
            FormFileEvent::Deleted(path) => self.unregister(&path),
        }
    }

    /// Reload the form at `path` and insert, refresh or drop its unit.
    async fn refresh(&self, path: &str) {
        let form = match self.forms.load(path).await {
            Ok(Some(form)) if form.qualifies_for_auto_trigger() => form,
            Ok(_) => {
                self.unregister(path);
                return;
            }
            Err(err) => {
                tracing::warn!(%err, path, "cannot load form, dropping from auto-trigger");
                self.unregister(path);
                return;
            }
        };
        let mut units = self.registry();
        match units.get_mut(path) {
            Some(unit) => unit.config = form,
            None => {
                tracing::info!(path, "monitoring form for auto-trigger");
                units.insert(
                    path.to_string(),
                    MonitoredUnit {
                        file_path: path.to_string(),
                        config: form,
                        is_running: false,
                    },
                );
            }
        }
    }

    fn unregister(&self, path: &str) {
        if self.registry().remove(path).is_some() {
            tracing::info!(path, "stopped monitoring form");
        }
    }

    /// Run one tick at the current time. Returns the paths that fired.
    pub async fn tick(&self) -> Vec<String> {
        self.tick_at(time::now()).await
    }

    /// Run one tick as if the clock read `now`.
    pub async fn tick_at(&self, now: Timestamp) -> Vec<String> {
        let candidates: Vec<(String, FormConfig)> = self
            .registry()
            .values()
            .filter(|unit| !unit.is_running)
            .map(|unit| (unit.file_path.clone(), unit.config.clone()))
            .collect();

        let mut fired = Vec::new();
        for (path, form) in candidates {
            if self.process(&path, form, now).await {
                fired.push(path);
            }
        }
        fired
    }

    fn cooldown_millis(&self, form: &FormConfig) -> i64 {
        let configured = form
            .auto_trigger
            .cooldown_seconds
            .map_or(Duration::ZERO, Duration::from_secs);
        let cooldown = self.config.min_cooldown.max(configured);
        i64::try_from(cooldown.as_millis()).unwrap_or(i64::MAX)
    }

    fn in_cooldown(&self, form: &FormConfig, now_millis: i64) -> bool {
        form.last_execution_time
            .is_some_and(|last| now_millis.saturating_sub(last) < self.cooldown_millis(form))
    }

    async fn context(&self, path: &str, form: &FormConfig, now: Timestamp) -> EvaluationContext {
        EvaluationContext::capture(&self.workspace, &self.host, now)
            .await
            .with_form(path, form.clone())
    }

    async fn process(&self, path: &str, form: FormConfig, now: Timestamp) -> bool {
        let now_millis = now.timestamp_millis();
        if self.in_cooldown(&form, now_millis) {
            tracing::debug!(path, "inside cooldown, skipping");
            return false;
        }

        let tree = form.startup_conditions.as_ref();
        let ctx = self.context(path, &form, now).await;
        let candidacy = self
            .engine
            .evaluate_conditions(tree, &ctx, ConditionCategory::AutoTrigger)
            .await;
        if !candidacy.satisfied {
            tracing::debug!(path, details = %candidacy.details, "gate closed");
            return false;
        }

        let ctx = self.context(path, &form, now).await;
        let confirmation = self
            .engine
            .evaluate_conditions(tree, &ctx, ConditionCategory::AutoTrigger)
            .await;
        if !confirmation.satisfied {
            tracing::debug!(path, details = %confirmation.details, "gate closed before firing");
            return false;
        }

        if !self.claim(path, now_millis) {
            return false;
        }
        tracing::info!(path, "auto-triggering form");
        if let Err(err) = self.runner.run(&form, &ctx).await {
            tracing::warn!(%err, path, "auto-triggered actions failed");
        }
        if let Err(err) = self.forms.patch_last_execution_time(path, now_millis).await {
            tracing::warn!(%err, path, "cannot persist last execution time");
        }
        self.release(path, now_millis);
        true
    }

    /// Mark the unit running if it is still registered, idle and out of cooldown.
    fn claim(&self, path: &str, now_millis: i64) -> bool {
        let mut units = self.registry();
        let Some(unit) = units.get_mut(path) else {
            return false;
        };
        if unit.is_running || self.in_cooldown(&unit.config, now_millis) {
            return false;
        }
        unit.is_running = true;
        true
    }

    fn release(&self, path: &str, fired_at: i64) {
        if let Some(unit) = self.registry().get_mut(path) {
            unit.is_running = false;
            unit.config.last_execution_time = Some(fired_at);
        }
    }

    /// Drive the scheduler until `shutdown` turns `true` or its sender is dropped.
    ///
    /// Loads the registry, then interleaves ticks with file events on one task.
    pub async fn run(
        self: Arc<Self>,
        mut events: mpsc::Receiver<FormFileEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        if let Err(err) = self.load_all().await {
            tracing::warn!(%err, "initial form discovery failed");
        }
        let mut ticker = tokio::time::interval_at(
            Instant::now() + self.config.initial_delay,
            self.config.tick_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let fired = self.tick().await;
                    if !fired.is_empty() {
                        tracing::info!(count = fired.len(), "auto-trigger tick fired forms");
                    }
                }
                Some(event) = events.recv() => self.handle_event(event).await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("auto-trigger scheduler stopped");
    }
}
