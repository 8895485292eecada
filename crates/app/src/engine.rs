//! Condition engine: recursive evaluation of execution gates.
//!
//! Group nodes fold their children left to right under their [`Relation`],
//! stopping as soon as the outcome is decided. Leaves are dispatched by
//! [`ConditionKind`] to a [`LeafEvaluator`] looked up in a registry, so new
//! kinds are added by registering a strategy.
//!
//! No error escapes [`ConditionEngine::evaluate_conditions`]: malformed
//! configuration, failed lookups and script failures all end up in the
//! returned [`EvaluationResult`].

mod context;
pub mod evaluators;
mod variables;

pub use context::{EvaluationContext, HostInfo};
pub use variables::VariableResolver;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use formgate_domain::condition::{Condition, ConditionCategory, ConditionKind, Relation};
use formgate_domain::evaluation::EvaluationResult;

use crate::ports::{DocumentStore, EditorWorkspace, ScriptHost, TemplateExpander};

/// Strategy evaluating one leaf kind.
#[async_trait]
pub trait LeafEvaluator: Send + Sync {
    async fn evaluate(&self, condition: &Condition, ctx: &EvaluationContext) -> EvaluationResult;
}

type BoxedEvaluation<'a> = Pin<Box<dyn Future<Output = EvaluationResult> + Send + 'a>>;

/// Tree walker with a registry of leaf strategies.
#[derive(Default)]
pub struct ConditionEngine {
    evaluators: RwLock<HashMap<ConditionKind, Arc<dyn LeafEvaluator>>>,
}

impl ConditionEngine {
    /// Engine with no leaf strategies registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with the built-in `time`, `file`, `system`, `script` and
    /// `field` strategies.
    #[must_use]
    pub fn with_default_evaluators<D>(
        documents: D,
        scripts: Arc<dyn ScriptHost>,
        templates: Arc<dyn TemplateExpander>,
    ) -> Self
    where
        D: DocumentStore + EditorWorkspace + Clone + Send + Sync + 'static,
    {
        let variables = VariableResolver::new(templates);
        let engine = Self::new();
        engine.register_evaluator(ConditionKind::Time, Arc::new(evaluators::TimeEvaluator));
        engine.register_evaluator(
            ConditionKind::File,
            Arc::new(evaluators::FileEvaluator::new(documents.clone(), variables.clone())),
        );
        engine.register_evaluator(
            ConditionKind::System,
            Arc::new(evaluators::SystemEvaluator::new(documents, variables)),
        );
        engine.register_evaluator(
            ConditionKind::Script,
            Arc::new(evaluators::ScriptEvaluator::new(scripts)),
        );
        engine.register_evaluator(ConditionKind::Field, Arc::new(evaluators::FieldEvaluator));
        engine
    }

    /// Add or replace the strategy for `kind`.
    pub fn register_evaluator(&self, kind: ConditionKind, evaluator: Arc<dyn LeafEvaluator>) {
        tracing::debug!(%kind, "registering condition evaluator");
        self.evaluators
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, evaluator);
    }

    /// Evaluate a gate under `category`. A form without a gate is always allowed.
    pub async fn evaluate_conditions(
        &self,
        tree: Option<&Condition>,
        ctx: &EvaluationContext,
        category: ConditionCategory,
    ) -> EvaluationResult {
        match tree {
            None => EvaluationResult::satisfied("no conditions configured"),
            Some(root) => self.evaluate(root, ctx, category).await,
        }
    }

    /// Evaluate one node and its subtree.
    pub fn evaluate<'a>(
        &'a self,
        node: &'a Condition,
        ctx: &'a EvaluationContext,
        category: ConditionCategory,
    ) -> BoxedEvaluation<'a> {
        Box::pin(async move {
            if !is_active(node, category) {
                return EvaluationResult::satisfied(format!("{} skipped", node.label()));
            }
            if node.is_group() {
                return self.evaluate_group(node, ctx, category).await;
            }
            let Some(evaluator) = self.evaluator_for(&node.kind) else {
                return EvaluationResult::unsatisfied(format!(
                    "unknown condition kind '{}'",
                    node.kind
                ));
            };
            evaluator.evaluate(node, ctx).await
        })
    }

    async fn evaluate_group(
        &self,
        node: &Condition,
        ctx: &EvaluationContext,
        category: ConditionCategory,
    ) -> EvaluationResult {
        let relation = node.relation;
        let mut children = Vec::new();
        for child in node.children.iter().filter(|c| is_active(c, category)) {
            let result = self.evaluate(child, ctx, category).await;
            let satisfied = result.satisfied;
            children.push(result);
            if relation.decides(satisfied) {
                return EvaluationResult::from_outcome(satisfied, group_details(node, relation))
                    .with_children(children);
            }
        }
        if children.is_empty() {
            return EvaluationResult::satisfied(format!("{} has no active conditions", node.label()));
        }
        EvaluationResult::from_outcome(relation.exhausted(), group_details(node, relation))
            .with_children(children)
    }

    fn evaluator_for(&self, kind: &ConditionKind) -> Option<Arc<dyn LeafEvaluator>> {
        self.evaluators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(kind)
            .cloned()
    }
}

fn is_active(node: &Condition, category: ConditionCategory) -> bool {
    node.enabled && node.applies_to(category)
}

fn group_details(node: &Condition, relation: Relation) -> String {
    match relation {
        Relation::And => format!("{}: all conditions must hold", node.label()),
        Relation::Or => format!("{}: any condition must hold", node.label()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Leaf returning `config.result`, counting its invocations.
    #[derive(Default)]
    struct SpyEvaluator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LeafEvaluator for SpyEvaluator {
        async fn evaluate(&self, condition: &Condition, _: &EvaluationContext) -> EvaluationResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = condition.config["result"].as_bool().unwrap_or(false);
            EvaluationResult::from_outcome(result, condition.label())
        }
    }

    fn spy_leaf(id: &str, result: bool) -> Condition {
        Condition::leaf(ConditionKind::Custom("spy".to_string()), json!({ "result": result }))
            .with_id(id)
    }

    fn engine_with_spy() -> (ConditionEngine, Arc<SpyEvaluator>) {
        let engine = ConditionEngine::new();
        let spy = Arc::new(SpyEvaluator::default());
        engine.register_evaluator(ConditionKind::Custom("spy".to_string()), spy.clone());
        (engine, spy)
    }

    async fn eval(engine: &ConditionEngine, tree: &Condition) -> EvaluationResult {
        engine
            .evaluate_conditions(Some(tree), &EvaluationContext::default(), ConditionCategory::Startup)
            .await
    }

    #[tokio::test]
    async fn should_require_every_child_for_and() {
        let (engine, _) = engine_with_spy();
        let all = Condition::group(Relation::And, vec![spy_leaf("a", true), spy_leaf("b", true)]);
        assert!(eval(&engine, &all).await.satisfied);

        let one_false =
            Condition::group(Relation::And, vec![spy_leaf("a", true), spy_leaf("b", false)]);
        assert!(!eval(&engine, &one_false).await.satisfied);
    }

    #[tokio::test]
    async fn should_require_any_child_for_or() {
        let (engine, _) = engine_with_spy();
        let one_true =
            Condition::group(Relation::Or, vec![spy_leaf("a", false), spy_leaf("b", true)]);
        assert!(eval(&engine, &one_true).await.satisfied);

        let none = Condition::group(Relation::Or, vec![spy_leaf("a", false), spy_leaf("b", false)]);
        assert!(!eval(&engine, &none).await.satisfied);
    }

    #[tokio::test]
    async fn should_stop_and_group_at_first_unsatisfied_child() {
        let (engine, spy) = engine_with_spy();
        let tree = Condition::group(
            Relation::And,
            vec![spy_leaf("a", false), spy_leaf("b", true), spy_leaf("c", true)],
        );
        let result = eval(&engine, &tree).await;
        assert!(!result.satisfied);
        assert_eq!(spy.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.child_results.len(), 1);
    }

    #[tokio::test]
    async fn should_stop_or_group_at_first_satisfied_child() {
        let (engine, spy) = engine_with_spy();
        let tree = Condition::group(
            Relation::Or,
            vec![spy_leaf("a", false), spy_leaf("b", true), spy_leaf("c", false)],
        );
        assert!(eval(&engine, &tree).await.satisfied);
        assert_eq!(spy.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn should_ignore_disabled_children() {
        let (engine, spy) = engine_with_spy();
        let and = Condition::group(
            Relation::And,
            vec![spy_leaf("a", true), spy_leaf("b", false).with_enabled(false)],
        );
        assert!(eval(&engine, &and).await.satisfied);

        let or = Condition::group(
            Relation::Or,
            vec![spy_leaf("a", false), spy_leaf("b", true).with_enabled(false)],
        );
        assert!(!eval(&engine, &or).await.satisfied);
        assert_eq!(spy.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn should_satisfy_empty_group_and_missing_tree() {
        let (engine, _) = engine_with_spy();
        assert!(eval(&engine, &Condition::group(Relation::Or, vec![])).await.satisfied);
        let result = engine
            .evaluate_conditions(None, &EvaluationContext::default(), ConditionCategory::Startup)
            .await;
        assert!(result.satisfied);
    }

    #[tokio::test]
    async fn should_report_unknown_kind_as_unsatisfied() {
        let engine = ConditionEngine::new();
        let leaf = Condition::leaf(ConditionKind::Custom("weather".to_string()), json!({}));
        let result = eval(&engine, &leaf).await;
        assert!(!result.satisfied);
        assert!(result.details.contains("unknown condition kind"));
    }

    #[tokio::test]
    async fn should_skip_leaves_tagged_for_another_category() {
        let (engine, spy) = engine_with_spy();
        let tree = Condition::group(
            Relation::And,
            vec![
                spy_leaf("auto", false).with_category(ConditionCategory::AutoTrigger),
                spy_leaf("any", true),
            ],
        );
        assert!(eval(&engine, &tree).await.satisfied);
        assert_eq!(spy.calls.load(Ordering::SeqCst), 1);

        let auto = engine
            .evaluate_conditions(
                Some(&tree),
                &EvaluationContext::default(),
                ConditionCategory::AutoTrigger,
            )
            .await;
        assert!(!auto.satisfied);
    }

    #[tokio::test]
    async fn should_evaluate_nested_groups() {
        let (engine, _) = engine_with_spy();
        let tree = Condition::group(
            Relation::And,
            vec![
                spy_leaf("a", true),
                Condition::group(Relation::Or, vec![spy_leaf("b", false), spy_leaf("c", true)]),
            ],
        );
        let result = eval(&engine, &tree).await;
        assert!(result.satisfied);
        assert_eq!(result.child_results.len(), 2);
        assert_eq!(result.child_results[1].child_results.len(), 2);
    }

    #[tokio::test]
    async fn should_replace_registered_evaluator() {
        struct Always;
        #[async_trait]
        impl LeafEvaluator for Always {
            async fn evaluate(&self, _: &Condition, _: &EvaluationContext) -> EvaluationResult {
                EvaluationResult::satisfied("always")
            }
        }

        let (engine, _) = engine_with_spy();
        let leaf = spy_leaf("a", false);
        assert!(!eval(&engine, &leaf).await.satisfied);
        engine.register_evaluator(ConditionKind::Custom("spy".to_string()), Arc::new(Always));
        assert!(eval(&engine, &leaf).await.satisfied);
    }
}
