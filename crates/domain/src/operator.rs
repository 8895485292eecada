//! Operator library: pure comparison and set functions shared by every leaf.
//!
//! Operators never fail: unknown names deserialize as [`Operator::Equals`]
//! and a missing actual value is never satisfied.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison applied between an observed value and a configured one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    #[default]
    Equals,
    NotEquals,
    Contains,
    NotContains,
    In,
    NotIn,
    Between,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl Operator {
    /// Canonical name as written in configuration files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "Equals",
            Self::NotEquals => "NotEquals",
            Self::Contains => "Contains",
            Self::NotContains => "NotContains",
            Self::In => "In",
            Self::NotIn => "NotIn",
            Self::Between => "Between",
            Self::LessThan => "LessThan",
            Self::LessThanOrEqual => "LessThanOrEqual",
            Self::GreaterThan => "GreaterThan",
            Self::GreaterThanOrEqual => "GreaterThanOrEqual",
        }
    }

    /// Parse an operator name, falling back to [`Operator::Equals`].
    ///
    /// Accepts canonical names case-insensitively plus the usual symbols
    /// (`==`, `!=`, `<`, `<=`, `>`, `>=`).
    #[must_use]
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "notequals" | "!=" | "<>" => Self::NotEquals,
            "contains" => Self::Contains,
            "notcontains" => Self::NotContains,
            "in" => Self::In,
            "notin" => Self::NotIn,
            "between" => Self::Between,
            "lessthan" | "<" => Self::LessThan,
            "lessthanorequal" | "<=" => Self::LessThanOrEqual,
            "greaterthan" | ">" => Self::GreaterThan,
            "greaterthanorequal" | ">=" => Self::GreaterThanOrEqual,
            _ => Self::Equals,
        }
    }

    /// Whether the operator expresses an exclusion (`NotEquals`, `NotContains`, `NotIn`).
    #[must_use]
    pub fn is_negative(self) -> bool {
        matches!(self, Self::NotEquals | Self::NotContains | Self::NotIn)
    }

    /// Apply the operator to an observed value.
    ///
    /// - `Equals`/`NotEquals` compare string-coerced values.
    /// - `Contains`/`NotContains` test substring containment, or element
    ///   membership when `actual` is an array.
    /// - `In`/`NotIn` test membership in `expected` (array or comma-separated).
    /// - `Between` is inclusive on `[low, high]` given as a two-element array
    ///   or `"low,high"`; numeric when both sides parse as numbers.
    /// - Ordering operators compare numerically when possible, else lexicographically.
    ///
    /// A missing (or `null`) actual value is never satisfied.
    #[must_use]
    pub fn apply(self, actual: Option<&Value>, expected: &Value) -> bool {
        let Some(actual) = actual.filter(|v| !v.is_null()) else {
            return false;
        };
        match self {
            Self::Equals => loosely_equal(actual, expected),
            Self::NotEquals => !loosely_equal(actual, expected),
            Self::Contains => contains(actual, expected),
            Self::NotContains => !contains(actual, expected),
            Self::In => is_member(actual, expected),
            Self::NotIn => !is_member(actual, expected),
            Self::Between => is_between(actual, expected),
            Self::LessThan => compare_values(actual, expected) == Ordering::Less,
            Self::LessThanOrEqual => compare_values(actual, expected) != Ordering::Greater,
            Self::GreaterThan => compare_values(actual, expected) == Ordering::Greater,
            Self::GreaterThanOrEqual => compare_values(actual, expected) != Ordering::Less,
        }
    }

    /// Map an already computed ordering (`actual` vs `expected`) through the operator.
    ///
    /// Used for comparisons that define their own ordering, such as versions.
    /// Set and containment operators collapse to equality.
    #[must_use]
    pub fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::LessThan => ordering == Ordering::Less,
            Self::LessThanOrEqual => ordering != Ordering::Greater,
            Self::GreaterThan => ordering == Ordering::Greater,
            Self::GreaterThanOrEqual => ordering != Ordering::Less,
            Self::NotEquals | Self::NotContains | Self::NotIn => ordering != Ordering::Equal,
            Self::Equals | Self::Contains | Self::In | Self::Between => {
                ordering == Ordering::Equal
            }
        }
    }
}

impl From<String> for Operator {
    fn from(value: String) -> Self {
        Self::parse_lenient(&value)
    }
}

impl From<Operator> for String {
    fn from(value: Operator) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coerce a JSON value to the string used by equality and containment checks.
///
/// Arrays join their coerced elements with `", "`; `null` becomes `""`.
#[must_use]
pub fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(coerce_to_string)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

/// Boolean coercion of an expression result.
///
/// `null`, `false`, `0`, `NaN` and `""` are false; everything else is true.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0 && !x.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Interpret a value as a number when it is one or parses as one.
#[must_use]
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Total ordering between two values: numeric when both are numbers, else by string.
#[must_use]
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => coerce_to_string(a).cmp(&coerce_to_string(b)),
    }
}

fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    if let (Some(x), Some(y)) = (as_number(actual), as_number(expected))
        && actual.is_number() != expected.is_number()
    {
        return (x - y).abs() < f64::EPSILON;
    }
    coerce_to_string(actual) == coerce_to_string(expected)
}

fn contains(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::Array(items) => items.iter().any(|item| loosely_equal(item, expected)),
        _ => coerce_to_string(actual).contains(&coerce_to_string(expected)),
    }
}

/// Split the configured side of a set operator into its members.
fn expected_members(expected: &Value) -> Vec<Value> {
    match expected {
        Value::Array(items) => items.clone(),
        Value::String(s) => s
            .split(',')
            .map(|part| Value::String(part.trim().to_string()))
            .filter(|v| v.as_str().is_some_and(|s| !s.is_empty()))
            .collect(),
        other => vec![other.clone()],
    }
}

fn is_member(actual: &Value, expected: &Value) -> bool {
    let members = expected_members(expected);
    let check = |value: &Value| members.iter().any(|m| loosely_equal(value, m));
    match actual {
        Value::Array(items) => items.iter().any(check),
        _ => check(actual),
    }
}

fn is_between(actual: &Value, expected: &Value) -> bool {
    let members = expected_members(expected);
    let [low, high] = members.as_slice() else {
        return false;
    };
    compare_values(actual, low) != Ordering::Less && compare_values(actual, high) != Ordering::Greater
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_compare_equals_with_string_coercion() {
        assert!(Operator::Equals.apply(Some(&json!(5)), &json!("5")));
        assert!(Operator::Equals.apply(Some(&json!("done")), &json!("done")));
        assert!(!Operator::Equals.apply(Some(&json!("done")), &json!("todo")));
        assert!(Operator::NotEquals.apply(Some(&json!(true)), &json!("false")));
    }

    #[test]
    fn should_never_satisfy_missing_actual() {
        for op in [
            Operator::Equals,
            Operator::NotEquals,
            Operator::Contains,
            Operator::NotContains,
            Operator::In,
            Operator::NotIn,
            Operator::Between,
            Operator::LessThan,
            Operator::GreaterThanOrEqual,
        ] {
            assert!(!op.apply(None, &json!("x")), "{op} matched a missing value");
            assert!(!op.apply(Some(&Value::Null), &json!("x")));
        }
    }

    #[test]
    fn should_check_substring_and_array_membership_for_contains() {
        assert!(Operator::Contains.apply(Some(&json!("weekly review")), &json!("review")));
        assert!(Operator::Contains.apply(Some(&json!(["work", "urgent"])), &json!("urgent")));
        assert!(!Operator::Contains.apply(Some(&json!(["work"])), &json!("wor")));
        assert!(Operator::NotContains.apply(Some(&json!("notes")), &json!("todo")));
    }

    #[test]
    fn should_test_set_membership_for_in_and_not_in() {
        assert!(Operator::In.apply(Some(&json!("b")), &json!(["a", "b"])));
        assert!(Operator::In.apply(Some(&json!("b")), &json!("a, b, c")));
        assert!(Operator::In.apply(Some(&json!(2)), &json!([1, 2, 3])));
        assert!(Operator::NotIn.apply(Some(&json!("z")), &json!(["a", "b"])));
    }

    #[test]
    fn should_test_inclusive_bounds_for_between() {
        assert!(Operator::Between.apply(Some(&json!(5)), &json!([1, 5])));
        assert!(Operator::Between.apply(Some(&json!("10")), &json!("2,10")));
        assert!(!Operator::Between.apply(Some(&json!(11)), &json!([1, 10])));
        assert!(Operator::Between.apply(Some(&json!("b")), &json!(["a", "c"])));
        assert!(!Operator::Between.apply(Some(&json!(1)), &json!([1])));
    }

    #[test]
    fn should_order_numerically_when_both_sides_are_numbers() {
        assert!(Operator::LessThan.apply(Some(&json!("9")), &json!("10")));
        assert!(Operator::GreaterThan.apply(Some(&json!(10)), &json!(9)));
        assert!(Operator::LessThanOrEqual.apply(Some(&json!(3)), &json!(3)));
        assert!(Operator::GreaterThan.apply(Some(&json!("b")), &json!("a")));
    }

    #[test]
    fn should_fall_back_to_equals_for_unknown_operator_names() {
        let op: Operator = serde_json::from_value(json!("SomethingElse")).unwrap();
        assert_eq!(op, Operator::Equals);
        let op: Operator = serde_json::from_value(json!(">=")).unwrap();
        assert_eq!(op, Operator::GreaterThanOrEqual);
        assert_eq!(serde_json::to_value(Operator::NotIn).unwrap(), json!("NotIn"));
    }

    #[test]
    fn should_coerce_values_to_booleans() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("false")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!(0.5)));
    }

    #[test]
    fn should_map_orderings_through_operator() {
        assert!(Operator::Equals.accepts(Ordering::Equal));
        assert!(Operator::NotEquals.accepts(Ordering::Less));
        assert!(Operator::GreaterThanOrEqual.accepts(Ordering::Equal));
        assert!(!Operator::GreaterThan.accepts(Ordering::Equal));
        assert!(Operator::LessThan.accepts(Ordering::Less));
    }
}
