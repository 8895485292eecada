//! Field leaves: compare a form field's current value.

use async_trait::async_trait;

use formgate_domain::condition::{Condition, FieldConditionConfig};
use formgate_domain::evaluation::EvaluationResult;

use super::parse_config;
use crate::engine::{EvaluationContext, LeafEvaluator};

/// Strategy for `field` leaves.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldEvaluator;

#[async_trait]
impl LeafEvaluator for FieldEvaluator {
    async fn evaluate(&self, condition: &Condition, ctx: &EvaluationContext) -> EvaluationResult {
        let config: FieldConditionConfig = match parse_config(condition) {
            Ok(config) => config,
            Err(result) => return result,
        };
        let actual = ctx.field_value(&config.field_id);
        let satisfied = config.operator.apply(actual.as_ref(), &config.value);
        EvaluationResult::from_outcome(
            satisfied,
            format!(
                "field {} = {} {} {}",
                config.field_id,
                actual.map_or_else(|| "missing".to_string(), |v| v.to_string()),
                config.operator,
                config.value
            ),
        )
    }
}
