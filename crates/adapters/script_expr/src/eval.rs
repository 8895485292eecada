//! Tree-walking evaluator with JavaScript-flavoured coercions.

use serde_json::{Map, Value};

use formgate_app::ports::ScriptError;
use formgate_domain::operator::{coerce_to_string, is_truthy};

use crate::parser::{BinaryOp, Expr, UnaryOp};

type EvalResult = Result<Value, ScriptError>;

pub(crate) fn evaluate(expr: &Expr, scope: &Map<String, Value>) -> EvalResult {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Array(items) => items
            .iter()
            .map(|item| evaluate(item, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expr::Ident(name) => scope
            .get(name)
            .cloned()
            .ok_or_else(|| runtime(format!("{name} is not defined"))),
        Expr::Member(target, name) => member(&evaluate(target, scope)?, name),
        Expr::Index(target, index) => {
            let target = evaluate(target, scope)?;
            let index = evaluate(index, scope)?;
            match (&target, &index) {
                (Value::Array(items), Value::Number(n)) => Ok(n
                    .as_u64()
                    .and_then(|i| items.get(usize::try_from(i).ok()?))
                    .cloned()
                    .unwrap_or(Value::Null)),
                (Value::String(s), Value::Number(n)) => Ok(n
                    .as_u64()
                    .and_then(|i| s.chars().nth(usize::try_from(i).ok()?))
                    .map_or(Value::Null, |c| Value::String(c.to_string()))),
                _ => member(&target, &coerce_to_string(&index)),
            }
        }
        Expr::Call {
            target,
            method,
            args,
        } => {
            let target = evaluate(target, scope)?;
            let args = args
                .iter()
                .map(|arg| evaluate(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            call(&target, method, &args)
        }
        Expr::Unary(UnaryOp::Not, operand) => Ok(Value::Bool(!is_truthy(&evaluate(operand, scope)?))),
        Expr::Unary(UnaryOp::Negate, operand) => Ok(number(-to_number(&evaluate(operand, scope)?))),
        Expr::Binary(BinaryOp::And, left, right) => {
            let left = evaluate(left, scope)?;
            if is_truthy(&left) {
                evaluate(right, scope)
            } else {
                Ok(left)
            }
        }
        Expr::Binary(BinaryOp::Or, left, right) => {
            let left = evaluate(left, scope)?;
            if is_truthy(&left) {
                Ok(left)
            } else {
                evaluate(right, scope)
            }
        }
        Expr::Binary(op, left, right) => {
            let left = evaluate(left, scope)?;
            let right = evaluate(right, scope)?;
            Ok(binary(*op, &left, &right))
        }
        Expr::Conditional(condition, then, otherwise) => {
            if is_truthy(&evaluate(condition, scope)?) {
                evaluate(then, scope)
            } else {
                evaluate(otherwise, scope)
            }
        }
    }
}

fn member(target: &Value, name: &str) -> EvalResult {
    match target {
        Value::Null => Err(runtime(format!("cannot read property '{name}' of null"))),
        Value::Object(map) => Ok(map.get(name).cloned().unwrap_or(Value::Null)),
        Value::String(s) if name == "length" => Ok(Value::from(s.chars().count())),
        Value::Array(items) if name == "length" => Ok(Value::from(items.len())),
        _ => Ok(Value::Null),
    }
}

fn call(target: &Value, method: &str, args: &[Value]) -> EvalResult {
    let arg = |i: usize| args.get(i).unwrap_or(&Value::Null);
    match (target, method) {
        (Value::String(s), "includes") => Ok(Value::Bool(s.contains(&coerce_to_string(arg(0))))),
        (Value::String(s), "startsWith") => {
            Ok(Value::Bool(s.starts_with(&coerce_to_string(arg(0)))))
        }
        (Value::String(s), "endsWith") => Ok(Value::Bool(s.ends_with(&coerce_to_string(arg(0))))),
        (Value::String(s), "toLowerCase") => Ok(Value::String(s.to_lowercase())),
        (Value::String(s), "toUpperCase") => Ok(Value::String(s.to_uppercase())),
        (Value::String(s), "trim") => Ok(Value::String(s.trim().to_string())),
        (Value::Array(items), "includes") => Ok(Value::Bool(
            items.iter().any(|item| strict_equal(item, arg(0))),
        )),
        (Value::Array(items), "join") => {
            let separator = match arg(0) {
                Value::Null => ",".to_string(),
                other => coerce_to_string(other),
            };
            Ok(Value::String(
                items
                    .iter()
                    .map(coerce_to_string)
                    .collect::<Vec<_>>()
                    .join(&separator),
            ))
        }
        (Value::Null, _) => Err(runtime(format!("cannot call '{method}' on null"))),
        _ => Err(runtime(format!("{method} is not a function"))),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => {
            if left.is_string() || right.is_string() {
                Value::String(format!("{}{}", display(left), display(right)))
            } else {
                number(to_number(left) + to_number(right))
            }
        }
        BinaryOp::Sub => number(to_number(left) - to_number(right)),
        BinaryOp::Mul => number(to_number(left) * to_number(right)),
        BinaryOp::Div => number(to_number(left) / to_number(right)),
        BinaryOp::Rem => number(to_number(left) % to_number(right)),
        BinaryOp::Eq => Value::Bool(loose_equal(left, right)),
        BinaryOp::NotEq => Value::Bool(!loose_equal(left, right)),
        BinaryOp::StrictEq => Value::Bool(strict_equal(left, right)),
        BinaryOp::StrictNotEq => Value::Bool(!strict_equal(left, right)),
        BinaryOp::Lt => Value::Bool(relational(left, right, |o| o.is_lt())),
        BinaryOp::Le => Value::Bool(relational(left, right, |o| o.is_le())),
        BinaryOp::Gt => Value::Bool(relational(left, right, |o| o.is_gt())),
        BinaryOp::Ge => Value::Bool(relational(left, right, |o| o.is_ge())),
        // Short-circuit operators never reach here.
        BinaryOp::And | BinaryOp::Or => Value::Null,
    }
}

fn relational(left: &Value, right: &Value, accept: fn(std::cmp::Ordering) -> bool) -> bool {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return accept(a.cmp(b));
    }
    to_number(left)
        .partial_cmp(&to_number(right))
        .is_some_and(accept)
}

#[allow(clippy::float_cmp)]
fn strict_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

#[allow(clippy::float_cmp)]
fn loose_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(_), Value::String(_))
        | (Value::Array(_) | Value::Object(_), _)
        | (_, Value::Array(_) | Value::Object(_)) => strict_equal(left, right),
        _ => to_number(left) == to_number(right),
    }
}

fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        other => coerce_to_string(other),
    }
}

/// JSON number for `n`, integral when possible. Non-finite results become `null`.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
pub(crate) fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

fn runtime(message: String) -> ScriptError {
    ScriptError::Runtime(message)
}
