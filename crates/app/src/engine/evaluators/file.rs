//! File leaves: existence, editor status, content and front-matter checks.

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use formgate_domain::condition::{
    Condition, FileConditionConfig, FileStatusCheck, FileSubType, PropertyCheck, TargetMode,
};
use formgate_domain::evaluation::EvaluationResult;

use super::{missing, parse_config};
use crate::engine::{EvaluationContext, LeafEvaluator, VariableResolver};
use crate::ports::{DocumentStore, EditorWorkspace};

const DEFAULT_EXTENSION: &str = "md";

/// Strategy for `file` leaves.
pub struct FileEvaluator<D> {
    documents: D,
    variables: VariableResolver,
}

impl<D> FileEvaluator<D>
where
    D: DocumentStore + EditorWorkspace + Send + Sync,
{
    pub fn new(documents: D, variables: VariableResolver) -> Self {
        Self {
            documents,
            variables,
        }
    }

    /// Path of the document a leaf targets, `None` when there is none.
    fn target(&self, config: &FileConditionConfig, ctx: &EvaluationContext) -> Option<String> {
        match config.target_mode {
            TargetMode::CurrentFile => ctx.active_file.clone(),
            TargetMode::SpecificFile => {
                let raw = config.target_file_path.as_deref()?;
                let resolved = self.variables.resolve(raw, ctx);
                let resolved = resolved.trim().trim_start_matches('/');
                if resolved.is_empty() {
                    return None;
                }
                if Path::new(resolved).extension().is_some() {
                    Some(resolved.to_string())
                } else {
                    Some(format!("{resolved}.{DEFAULT_EXTENSION}"))
                }
            }
        }
    }

    async fn file_exists(
        &self,
        config: &FileConditionConfig,
        target: Option<&str>,
    ) -> EvaluationResult {
        let exists = match target {
            Some(path) => match self.documents.exists(path).await {
                Ok(exists) => exists,
                Err(err) => {
                    return EvaluationResult::failed(format!("cannot look up {path}"), err.to_string());
                }
            },
            None => false,
        };
        let want_absent = config.operator.is_negative();
        let label = target.unwrap_or("no target file");
        EvaluationResult::from_outcome(
            exists != want_absent,
            if exists {
                format!("{label} exists")
            } else {
                format!("{label} does not exist")
            },
        )
    }

    async fn file_status(
        &self,
        condition: &Condition,
        config: &FileConditionConfig,
        target: Option<&str>,
        ctx: &EvaluationContext,
    ) -> EvaluationResult {
        if config.file_status_checks.is_empty() {
            return missing(condition, "fileStatusChecks");
        }
        let open = self.documents.open_files().await;
        let all = target.is_some_and(|path| {
            config.file_status_checks.iter().all(|check| match check {
                FileStatusCheck::IsOpen => open.iter().any(|f| f == path),
                FileStatusCheck::IsActive => ctx.active_file.as_deref() == Some(path),
            })
        });
        let satisfied = if config.operator.is_negative() { !all } else { all };
        EvaluationResult::from_outcome(
            satisfied,
            format!(
                "{} {} {:?}",
                target.unwrap_or("no target file"),
                config.operator,
                config.file_status_checks
            ),
        )
    }

    async fn content_contains(
        &self,
        condition: &Condition,
        config: &FileConditionConfig,
        target: Option<&str>,
        ctx: &EvaluationContext,
    ) -> EvaluationResult {
        let Some(search) = config.search_text.as_deref().filter(|s| !s.is_empty()) else {
            return missing(condition, "searchText");
        };
        let Some(path) = target else {
            return EvaluationResult::unsatisfied("no target file");
        };
        let search = self.variables.resolve(search, ctx);
        let text = match self.documents.read_text(path).await {
            Ok(Some(text)) => text,
            Ok(None) => return EvaluationResult::unsatisfied(format!("{path} not found")),
            Err(err) => {
                tracing::warn!(%err, path, "content unavailable, not blocking");
                return EvaluationResult::satisfied(format!("content of {path} unavailable"))
                    .with_error(err.to_string());
            }
        };
        let found = text.contains(&search);
        let satisfied = if config.operator.is_negative() { !found } else { found };
        EvaluationResult::from_outcome(
            satisfied,
            format!("{path} {} '{search}'", config.operator),
        )
    }

    async fn front_matter(
        &self,
        condition: &Condition,
        config: &FileConditionConfig,
        target: Option<&str>,
        ctx: &EvaluationContext,
    ) -> EvaluationResult {
        let checks = config.property_checks();
        if checks.is_empty() {
            return missing(condition, "properties");
        }
        let Some(path) = target else {
            return EvaluationResult::unsatisfied("no target file");
        };
        let properties = match self.documents.read_front_matter(path).await {
            Ok(Some(properties)) => properties,
            Ok(None) => return EvaluationResult::unsatisfied(format!("{path} not found")),
            Err(err) => {
                return EvaluationResult::failed(
                    format!("cannot read front-matter of {path}"),
                    err.to_string(),
                );
            }
        };
        let results: Vec<EvaluationResult> = checks
            .iter()
            .map(|check| self.property(check, properties.get(&check.name), ctx))
            .collect();
        let satisfied = results.iter().all(|r| r.satisfied);
        EvaluationResult::from_outcome(
            satisfied,
            format!("{path}: all {} properties must match", results.len()),
        )
        .with_children(results)
    }

    fn property(
        &self,
        check: &PropertyCheck,
        actual: Option<&Value>,
        ctx: &EvaluationContext,
    ) -> EvaluationResult {
        let expected = match &check.value {
            Value::String(s) => Value::String(self.variables.resolve(s, ctx)),
            other => other.clone(),
        };
        let satisfied = check.operator.apply(actual, &expected);
        let actual = actual.map_or_else(|| "missing".to_string(), Value::to_string);
        EvaluationResult::from_outcome(
            satisfied,
            format!("{} = {actual} {} {expected}", check.name, check.operator),
        )
    }
}

#[async_trait]
impl<D> LeafEvaluator for FileEvaluator<D>
where
    D: DocumentStore + EditorWorkspace + Send + Sync,
{
    async fn evaluate(&self, condition: &Condition, ctx: &EvaluationContext) -> EvaluationResult {
        let config: FileConditionConfig = match parse_config(condition) {
            Ok(config) => config,
            Err(result) => return result,
        };
        if config.target_mode == TargetMode::SpecificFile
            && config
                .target_file_path
                .as_deref()
                .is_none_or(|p| p.trim().is_empty())
        {
            return missing(condition, "targetFilePath");
        }
        let target = self.target(&config, ctx);
        let target = target.as_deref();
        match config.sub_type {
            FileSubType::FileExists => self.file_exists(&config, target).await,
            FileSubType::FileStatus => self.file_status(condition, &config, target, ctx).await,
            FileSubType::ContentContains => {
                self.content_contains(condition, &config, target, ctx).await
            }
            FileSubType::FrontmatterProperty => {
                self.front_matter(condition, &config, target, ctx).await
            }
        }
    }
}
