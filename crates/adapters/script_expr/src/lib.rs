//! # formgate-adapter-script-expr
//!
//! A small, side-effect free expression language used as the `ScriptHost`.
//!
//! Grammar:
//! ```text
//! Expr        ::= Or ( '?' Expr ':' Expr )?
//! Or          ::= And ( '||' And )*
//! And         ::= Equality ( '&&' Equality )*
//! Equality    ::= Comparison ( ( '==' | '!=' | '===' | '!==' ) Comparison )*
//! Comparison  ::= Additive ( ( '<' | '<=' | '>' | '>=' ) Additive )*
//! Additive    ::= Term ( ( '+' | '-' ) Term )*
//! Term        ::= Unary ( ( '*' | '/' | '%' ) Unary )*
//! Unary       ::= ( '!' | '-' ) Unary | Postfix
//! Postfix     ::= Primary ( '.' Ident [ '(' Args ')' ] | '[' Expr ']' )*
//! Primary     ::= Number | String | Ident | 'true' | 'false' | 'null'
//!               | '(' Expr ')' | '[' Args ']'
//! ```
//!
//! Identifiers resolve against the scope handed to
//! [`ScriptHost::evaluate`](formgate_app::ports::ScriptHost::evaluate) only;
//! an unknown name is a runtime error. There are no loops, assignments or
//! function definitions, so every evaluation terminates.
//!
//! ## Dependency rule
//! Depends on `formgate-app` (for the port trait) and `formgate-domain`.

mod eval;
mod lexer;
mod parser;

pub use parser::{BinaryOp, Expr, UnaryOp};

use serde_json::{Map, Value};

use formgate_app::ports::{ScriptError, ScriptHost};

/// Default maximum nesting depth of a parsed expression.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Parse an expression.
///
/// # Errors
///
/// Returns [`ScriptError::Syntax`] when the text is not a valid expression or
/// nests deeper than `max_depth`.
pub fn parse(expression: &str, max_depth: usize) -> Result<Expr, ScriptError> {
    let tokens = lexer::tokenize(expression)?;
    parser::Parser::new(tokens, max_depth).parse()
}

/// [`ScriptHost`] backed by the expression language.
#[derive(Debug, Clone, Copy)]
pub struct ExpressionHost {
    max_depth: usize,
}

impl ExpressionHost {
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

impl Default for ExpressionHost {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl ScriptHost for ExpressionHost {
    fn evaluate(
        &self,
        expression: &str,
        scope: &Map<String, Value>,
    ) -> Result<Value, ScriptError> {
        let expr = parse(expression, self.max_depth)?;
        let value = eval::evaluate(&expr, scope);
        if let Err(err) = &value {
            tracing::debug!(%err, expression, "expression failed");
        }
        value
    }
}
