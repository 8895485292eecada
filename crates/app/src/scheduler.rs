//! Background scheduling of auto-triggered forms.

mod auto_trigger;

pub use auto_trigger::{AutoTriggerScheduler, MonitoredUnit, SchedulerConfig};
