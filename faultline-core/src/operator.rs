//! Binary and quantified predicates over JSON values.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue};

use crate::error::OperatorError;

/// Binary comparison operators accepted by assertions.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not in")]
    NotIn,
    #[serde(rename = "is")]
    Is,
    #[serde(rename = "is not")]
    IsNot,
    #[serde(rename = "between")]
    Between,
    #[serde(rename = "contains")]
    Contains,
}

impl Operator {
    /// Every supported operator, in declaration order.
    pub const ALL: [Operator; 12] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Lt,
        Operator::Le,
        Operator::Gt,
        Operator::Ge,
        Operator::In,
        Operator::NotIn,
        Operator::Is,
        Operator::IsNot,
        Operator::Between,
        Operator::Contains,
    ];

    /// The operator's textual symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Is => "is",
            Operator::IsNot => "is not",
            Operator::Between => "between",
            Operator::Contains => "contains",
        }
    }

    /// Evaluates `actual <op> expected`.
    ///
    /// Incomparable operands (for example ordering a string against a number)
    /// make the predicate false rather than failing.
    pub fn apply(self, actual: &JsonValue, expected: &JsonValue) -> bool {
        match self {
            Operator::Eq => loose_eq(actual, expected),
            Operator::Ne => !loose_eq(actual, expected),
            Operator::Lt => compare(actual, expected) == Some(Ordering::Less),
            Operator::Le => matches!(
                compare(actual, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Operator::Gt => compare(actual, expected) == Some(Ordering::Greater),
            Operator::Ge => matches!(
                compare(actual, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::In => is_member(actual, expected),
            Operator::NotIn => !is_member(actual, expected),
            Operator::Is => actual == expected,
            Operator::IsNot => actual != expected,
            Operator::Between => between(actual, expected),
            Operator::Contains => is_member(expected, actual),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = OperatorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .into_iter()
            .find(|operator| operator.symbol() == value)
            .ok_or_else(|| OperatorError::UnsupportedOperator(value.to_string()))
    }
}

/// Quantifiers lifting an operator over a sequence.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantifier {
    All,
    Any,
}

impl Quantifier {
    /// Applies `element <op> expected` to every element and combines the results.
    ///
    /// `all` over an empty sequence is true and `any` over an empty sequence is false.
    pub fn apply(self, expected: &JsonValue, operator: Operator, sequence: &[JsonValue]) -> bool {
        match self {
            Quantifier::All => sequence
                .iter()
                .all(|element| operator.apply(element, expected)),
            Quantifier::Any => sequence
                .iter()
                .any(|element| operator.apply(element, expected)),
        }
    }
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantifier::All => f.write_str("all"),
            Quantifier::Any => f.write_str("any"),
        }
    }
}

impl FromStr for Quantifier {
    type Err = OperatorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "all" => Ok(Quantifier::All),
            "any" => Ok(Quantifier::Any),
            other => Err(OperatorError::UnsupportedQuantifier(other.to_string())),
        }
    }
}

/// Evaluates an operator given by its symbol.
pub fn apply(operator: &str, actual: &JsonValue, expected: &JsonValue) -> Result<bool, OperatorError> {
    Ok(operator.parse::<Operator>()?.apply(actual, expected))
}

/// Evaluates a quantified operator given by symbols.
pub fn apply_range(
    quantifier: &str,
    expected: &JsonValue,
    operator: &str,
    sequence: &[JsonValue],
) -> Result<bool, OperatorError> {
    let quantifier = quantifier.parse::<Quantifier>()?;
    let operator = operator.parse::<Operator>()?;
    Ok(quantifier.apply(expected, operator, sequence))
}

/// Equality that treats `1` and `1.0` as equal, recursing into containers.
pub(crate) fn loose_eq(left: &JsonValue, right: &JsonValue) -> bool {
    match (left, right) {
        (JsonValue::Number(left), JsonValue::Number(right)) => {
            compare_numbers(left, right) == Some(Ordering::Equal)
        }
        (JsonValue::Array(left), JsonValue::Array(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right.iter())
                    .all(|(left, right)| loose_eq(left, right))
        }
        (JsonValue::Object(left), JsonValue::Object(right)) => {
            left.len() == right.len()
                && left.iter().all(|(key, value)| {
                    right
                        .get(key)
                        .is_some_and(|other| loose_eq(value, other))
                })
        }
        _ => left == right,
    }
}

fn compare(left: &JsonValue, right: &JsonValue) -> Option<Ordering> {
    match (left, right) {
        (JsonValue::Number(left), JsonValue::Number(right)) => compare_numbers(left, right),
        (JsonValue::String(left), JsonValue::String(right)) => Some(left.cmp(right)),
        (JsonValue::Bool(left), JsonValue::Bool(right)) => Some(left.cmp(right)),
        (JsonValue::Array(left), JsonValue::Array(right)) => {
            for (left, right) in left.iter().zip(right.iter()) {
                match compare(left, right)? {
                    Ordering::Equal => continue,
                    other => return Some(other),
                }
            }
            Some(left.len().cmp(&right.len()))
        }
        _ => None,
    }
}

fn compare_numbers(left: &Number, right: &Number) -> Option<Ordering> {
    if let (Some(left), Some(right)) = (left.as_i64(), right.as_i64()) {
        return Some(left.cmp(&right));
    }
    if let (Some(left), Some(right)) = (left.as_u64(), right.as_u64()) {
        return Some(left.cmp(&right));
    }
    left.as_f64()?.partial_cmp(&right.as_f64()?)
}

fn is_member(member: &JsonValue, container: &JsonValue) -> bool {
    match (member, container) {
        (_, JsonValue::Array(items)) => items.iter().any(|item| loose_eq(item, member)),
        (JsonValue::String(needle), JsonValue::String(haystack)) => haystack.contains(needle.as_str()),
        (JsonValue::String(key), JsonValue::Object(map)) => map.contains_key(key),
        _ => false,
    }
}

fn between(actual: &JsonValue, bounds: &JsonValue) -> bool {
    let Some([low, high]) = bounds.as_array().map(Vec::as_slice) else {
        return false;
    };
    matches!(
        compare(low, actual),
        Some(Ordering::Less | Ordering::Equal)
    ) && matches!(
        compare(actual, high),
        Some(Ordering::Less | Ordering::Equal)
    )
}

#[cfg(test)]
#[path = "../tests/internal/operator_unit_tests.rs"]
mod tests;
