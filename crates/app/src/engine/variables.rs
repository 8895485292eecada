//! Variable resolver: substitutes `{{...}}` placeholders in leaf parameters.
//!
//! Two passes: `{{@<field>}}` references are replaced with the form field's
//! current value (or its default), then the remaining text is handed to the
//! [`TemplateExpander`] for dynamic tokens. Unresolvable references stay in
//! the output untouched.

use std::sync::Arc;

use formgate_domain::operator::coerce_to_string;

use super::EvaluationContext;
use crate::ports::TemplateExpander;

const FIELD_OPEN: &str = "{{@";
const CLOSE: &str = "}}";

/// Resolves field references and dynamic tokens.
#[derive(Clone)]
pub struct VariableResolver {
    templates: Arc<dyn TemplateExpander>,
}

impl VariableResolver {
    #[must_use]
    pub fn new(templates: Arc<dyn TemplateExpander>) -> Self {
        Self { templates }
    }

    /// Resolve every placeholder of `text` against `ctx`.
    #[must_use]
    pub fn resolve(&self, text: &str, ctx: &EvaluationContext) -> String {
        let fields = resolve_field_references(text, ctx);
        self.templates.expand(&fields, &ctx.now)
    }
}

fn resolve_field_references(text: &str, ctx: &EvaluationContext) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(FIELD_OPEN) {
        let body = &rest[start + FIELD_OPEN.len()..];
        let Some(len) = body.find(CLOSE) else {
            break;
        };
        let token_end = start + FIELD_OPEN.len() + len + CLOSE.len();
        out.push_str(&rest[..start]);
        match ctx.field_value(body[..len].trim()) {
            Some(value) if !value.is_null() => out.push_str(&coerce_to_string(&value)),
            _ => out.push_str(&rest[start..token_end]),
        }
        rest = &rest[token_end..];
    }
    out.push_str(rest);
    out
}
