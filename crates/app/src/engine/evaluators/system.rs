//! System leaves: formgate/host versions and the editor layout.

use async_trait::async_trait;

use formgate_domain::condition::{Condition, LayoutType, SystemConditionConfig, SystemSubType};
use formgate_domain::evaluation::EvaluationResult;
use formgate_domain::version::compare_versions;

use super::{missing, parse_config};
use crate::engine::{EvaluationContext, LeafEvaluator, VariableResolver};
use crate::ports::EditorWorkspace;

/// Open views at or above which the layout counts as split.
const SPLIT_VIEW_THRESHOLD: usize = 2;

/// Strategy for `system` leaves.
pub struct SystemEvaluator<W> {
    workspace: W,
    variables: VariableResolver,
}

impl<W: EditorWorkspace + Send + Sync> SystemEvaluator<W> {
    pub fn new(workspace: W, variables: VariableResolver) -> Self {
        Self {
            workspace,
            variables,
        }
    }

    async fn layout(&self) -> LayoutType {
        if self.workspace.open_files().await.len() >= SPLIT_VIEW_THRESHOLD {
            LayoutType::Split
        } else {
            LayoutType::Single
        }
    }
}

#[async_trait]
impl<W: EditorWorkspace + Send + Sync> LeafEvaluator for SystemEvaluator<W> {
    async fn evaluate(&self, condition: &Condition, ctx: &EvaluationContext) -> EvaluationResult {
        let config: SystemConditionConfig = match parse_config(condition) {
            Ok(config) => config,
            Err(result) => return result,
        };
        match config.sub_type {
            SystemSubType::PluginVersion | SystemSubType::HostVersion => {
                let Some(expected) = config.version.as_deref().filter(|v| !v.trim().is_empty())
                else {
                    return missing(condition, "version");
                };
                let expected = self.variables.resolve(expected, ctx);
                let (name, actual) = if config.sub_type == SystemSubType::PluginVersion {
                    ("formgate", ctx.plugin_version.as_str())
                } else {
                    ("host", ctx.host_version.as_str())
                };
                let ordering = compare_versions(actual, &expected);
                EvaluationResult::from_outcome(
                    config.operator.accepts(ordering),
                    format!("{name} version {actual} {} {expected}", config.operator),
                )
            }
            SystemSubType::WorkspaceLayout => {
                let Some(expected) = config.layout_type else {
                    return missing(condition, "layoutType");
                };
                let actual = self.layout().await;
                let same = actual == expected;
                EvaluationResult::from_outcome(
                    if config.operator.is_negative() { !same } else { same },
                    format!("layout {actual:?} {} {expected:?}", config.operator),
                )
            }
        }
    }
}
