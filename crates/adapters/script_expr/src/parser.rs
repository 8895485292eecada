//! Recursive-descent parser producing an [`Expr`] tree.

use serde_json::Value;

use formgate_app::ports::ScriptError;

use crate::lexer::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Array(Vec<Expr>),
    Ident(String),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call {
        target: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
}

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>, max_depth: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            max_depth,
        }
    }

    pub(crate) fn parse(mut self) -> Result<Expr, ScriptError> {
        if self.tokens.is_empty() {
            return Err(make_error("empty expression"));
        }
        let expr = self.expression()?;
        match self.peek() {
            None => Ok(expr),
            Some(token) => Err(make_error(&format!("unexpected token {token:?}"))),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ScriptError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(make_error(&format!(
                "expected {expected:?}, found {:?}",
                self.peek()
            )))
        }
    }

    fn enter(&mut self) -> Result<(), ScriptError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(make_error(&format!(
                "expression nests deeper than {}",
                self.max_depth
            )));
        }
        Ok(())
    }

    fn expression(&mut self) -> Result<Expr, ScriptError> {
        self.enter()?;
        let condition = self.binary(0)?;
        let expr = if self.eat(&Token::Question) {
            let then = self.expression()?;
            self.expect(&Token::Colon)?;
            let otherwise = self.expression()?;
            Expr::Conditional(Box::new(condition), Box::new(then), Box::new(otherwise))
        } else {
            condition
        };
        self.depth -= 1;
        Ok(expr)
    }

    /// Precedence climbing over the binary operator levels.
    ///
    /// Each operator folded into `left` nests the tree one level deeper, so
    /// it counts against the depth limit like a parenthesis does.
    fn binary(&mut self, level: usize) -> Result<Expr, ScriptError> {
        if level == LEVELS.len() {
            return self.unary();
        }
        let mut left = self.binary(level + 1)?;
        let mut nested = 0;
        while let Some(op) = self.peek().and_then(|token| binary_op(LEVELS[level], token)) {
            self.pos += 1;
            self.enter()?;
            nested += 1;
            let right = self.binary(level + 1)?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth -= nested;
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ScriptError> {
        let op = match self.peek() {
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Negate,
            _ => return self.postfix(),
        };
        self.pos += 1;
        self.enter()?;
        let operand = self.unary()?;
        self.depth -= 1;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn postfix(&mut self) -> Result<Expr, ScriptError> {
        let mut expr = self.primary()?;
        let mut nested = 0;
        loop {
            if matches!(self.peek(), Some(Token::Dot | Token::LBracket)) {
                self.enter()?;
                nested += 1;
            }
            if self.eat(&Token::Dot) {
                let name = match self.advance() {
                    Some(Token::Ident(name)) => name,
                    other => {
                        return Err(make_error(&format!(
                            "expected property name after '.', found {other:?}"
                        )));
                    }
                };
                if self.eat(&Token::LParen) {
                    let args = self.list(&Token::RParen)?;
                    expr = Expr::Call {
                        target: Box::new(expr),
                        method: name,
                        args,
                    };
                } else {
                    expr = Expr::Member(Box::new(expr), name);
                }
            } else if self.eat(&Token::LBracket) {
                let index = self.expression()?;
                self.expect(&Token::RBracket)?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else {
                self.depth -= nested;
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ScriptError> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Literal(crate::eval::number(n))),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Token::Ident(name)) => Ok(match name.as_str() {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" | "undefined" => Expr::Literal(Value::Null),
                _ => Expr::Ident(name),
            }),
            Some(Token::LParen) => {
                let expr = self.expression()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Some(Token::LBracket) => Ok(Expr::Array(self.list(&Token::RBracket)?)),
            Some(token) => Err(make_error(&format!("unexpected token {token:?}"))),
            None => Err(make_error("unexpected end of expression")),
        }
    }

    /// Comma-separated expressions up to `close`, which is consumed.
    fn list(&mut self, close: &Token) -> Result<Vec<Expr>, ScriptError> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.expression()?);
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(&Token::Comma)?;
        }
    }
}

#[derive(Clone, Copy)]
enum Level {
    Or,
    And,
    Equality,
    Comparison,
    Additive,
    Term,
}

const LEVELS: [Level; 6] = [
    Level::Or,
    Level::And,
    Level::Equality,
    Level::Comparison,
    Level::Additive,
    Level::Term,
];

fn binary_op(level: Level, token: &Token) -> Option<BinaryOp> {
    let op = match (level, token) {
        (Level::Or, Token::Or) => BinaryOp::Or,
        (Level::And, Token::And) => BinaryOp::And,
        (Level::Equality, Token::Eq) => BinaryOp::Eq,
        (Level::Equality, Token::NotEq) => BinaryOp::NotEq,
        (Level::Equality, Token::StrictEq) => BinaryOp::StrictEq,
        (Level::Equality, Token::StrictNotEq) => BinaryOp::StrictNotEq,
        (Level::Comparison, Token::Lt) => BinaryOp::Lt,
        (Level::Comparison, Token::Le) => BinaryOp::Le,
        (Level::Comparison, Token::Gt) => BinaryOp::Gt,
        (Level::Comparison, Token::Ge) => BinaryOp::Ge,
        (Level::Additive, Token::Plus) => BinaryOp::Add,
        (Level::Additive, Token::Minus) => BinaryOp::Sub,
        (Level::Term, Token::Star) => BinaryOp::Mul,
        (Level::Term, Token::Slash) => BinaryOp::Div,
        (Level::Term, Token::Percent) => BinaryOp::Rem,
        _ => return None,
    };
    Some(op)
}

fn make_error(message: &str) -> ScriptError {
    ScriptError::Syntax(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use serde_json::json;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Ident(name.to_string()))
    }

    fn lit(value: Value) -> Box<Expr> {
        Box::new(Expr::Literal(value))
    }

    #[test]
    fn should_bind_multiplication_tighter_than_addition() {
        let expr = parse("a + b * 2", 64).unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Add,
                ident("a"),
                Box::new(Expr::Binary(BinaryOp::Mul, ident("b"), lit(json!(2))))
            )
        );
    }

    #[test]
    fn should_bind_and_tighter_than_or() {
        let expr = parse("a || b && c", 64).unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Or,
                ident("a"),
                Box::new(Expr::Binary(BinaryOp::And, ident("b"), ident("c")))
            )
        );
    }

    #[test]
    fn should_parse_method_calls_and_members() {
        let expr = parse("values.name.startsWith('x')", 64).unwrap();
        assert_eq!(
            expr,
            Expr::Call {
                target: Box::new(Expr::Member(ident("values"), "name".to_string())),
                method: "startsWith".to_string(),
                args: vec![Expr::Literal(json!("x"))],
            }
        );
    }

    #[test]
    fn should_parse_right_nested_ternaries() {
        let expr = parse("a ? 1 : b ? 2 : 3", 64).unwrap();
        assert!(matches!(expr, Expr::Conditional(_, _, ref otherwise) if matches!(**otherwise, Expr::Conditional(..))));
    }

    #[test]
    fn should_reject_incomplete_input() {
        assert!(parse("", 64).is_err());
        assert!(parse("(a", 64).is_err());
        assert!(parse("a.", 64).is_err());
        assert!(parse("[1, 2", 64).is_err());
        assert!(parse("a ? b", 64).is_err());
    }

    #[test]
    fn should_count_unary_chains_against_depth() {
        assert!(parse(&format!("{}x", "!".repeat(10)), 64).is_ok());
        assert!(parse(&format!("{}x", "!".repeat(80)), 64).is_err());
    }

    #[test]
    fn should_count_operator_and_postfix_chains_against_depth() {
        assert!(parse(&format!("a{}", " && a".repeat(30)), 64).is_ok());
        assert!(parse(&format!("a{}", " && a".repeat(80)), 64).is_err());
        assert!(parse(&format!("a{}", ".b".repeat(30)), 64).is_ok());
        assert!(parse(&format!("a{}", ".b".repeat(80)), 64).is_err());
        assert!(parse(&format!("a{}", "[0]".repeat(80)), 64).is_err());
    }
}
