//! Built-in leaf strategies.

mod field;
mod file;
mod script;
mod system;
mod time;

pub use field::FieldEvaluator;
pub use file::FileEvaluator;
pub use script::{DEFAULT_SCRIPT_TIMEOUT, ScriptEvaluator, script_scope};
pub use system::SystemEvaluator;
pub use time::TimeEvaluator;

use formgate_domain::condition::{Condition, ConfigError};
use formgate_domain::evaluation::EvaluationResult;

/// Result for a leaf whose configuration cannot be used.
fn invalid_config(condition: &Condition, err: &ConfigError) -> EvaluationResult {
    tracing::debug!(condition = %condition, %err, "invalid condition configuration");
    EvaluationResult::failed(
        format!("{} has an invalid configuration", condition.label()),
        err.to_string(),
    )
}

/// Parse the typed config of `condition`, or return the failure result.
fn parse_config<T: serde::de::DeserializeOwned>(
    condition: &Condition,
) -> Result<T, EvaluationResult> {
    condition
        .config_as::<T>()
        .map_err(|err| invalid_config(condition, &err))
}

/// Failure result for a config that parsed but lacks a required value.
fn missing(condition: &Condition, what: &str) -> EvaluationResult {
    invalid_config(
        condition,
        &ConfigError::Invalid(format!("{what} is required")),
    )
}
