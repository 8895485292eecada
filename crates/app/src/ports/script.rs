//! Script host port: evaluates user expressions against an explicit scope.

use serde_json::{Map, Value};

/// Failure raised by a script host. Never crosses the leaf boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("script did not finish within {0} ms")]
    Timeout(u64),
}

/// A restricted expression evaluator.
///
/// The scope is the complete set of variables the expression can see; there
/// is no ambient global state. Evaluation is synchronous and may be moved to
/// a blocking thread by the caller.
pub trait ScriptHost: Send + Sync {
    /// Evaluate `expression` against `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Syntax`] for unparsable input and
    /// [`ScriptError::Runtime`] for evaluation failures such as unknown names.
    fn evaluate(&self, expression: &str, scope: &Map<String, Value>)
    -> Result<Value, ScriptError>;
}

impl<T: ScriptHost + ?Sized> ScriptHost for std::sync::Arc<T> {
    fn evaluate(
        &self,
        expression: &str,
        scope: &Map<String, Value>,
    ) -> Result<Value, ScriptError> {
        (**self).evaluate(expression, scope)
    }
}
