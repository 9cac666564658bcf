//! Path-addressed predicates over records and responses.
//!
//! Evaluation never errors: a predicate that does not hold yields
//! [`AssertionFailed`] carrying the rendered explanation.

use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::error::{AssertionFailed, PathError};
use crate::operator::{Operator, Quantifier};
use crate::path::{self, render, KeyPath, PathSegment};
use crate::runner::{Response, ResponseBody};

/// Message used when a body assertion meets a body that is not JSON.
pub const INVALID_JSON_RESPONSE: &str = "Assertion failed: invalid JSON response.";

/// Anything that can be checked against a JSON document.
pub trait Assertable {
    fn evaluate(&self, data: &JsonValue) -> Result<(), AssertionFailed>;
}

/// Maps projected list values before the quantified comparison.
pub type ValueTransform = Arc<dyn Fn(&JsonValue) -> JsonValue + Send + Sync>;

/// A predicate over a record.
#[derive(Clone, Debug)]
pub enum Assertion {
    /// Every segment of the path resolves.
    KeyExists(KeyPath),
    /// The full path does not resolve.
    KeyNotExists(KeyPath),
    /// The resolved value satisfies `actual <operator> expected`.
    Value {
        path: KeyPath,
        operator: Operator,
        expected: JsonValue,
    },
    /// A quantified predicate over one key projected from a list of objects.
    ListDict(ListDictAssertion),
}

impl Assertion {
    pub fn key_exists(path: KeyPath) -> Self {
        Assertion::KeyExists(path)
    }

    pub fn key_not_exists(path: KeyPath) -> Self {
        Assertion::KeyNotExists(path)
    }

    pub fn value(path: KeyPath, operator: Operator, expected: impl Into<JsonValue>) -> Self {
        Assertion::Value {
            path,
            operator,
            expected: expected.into(),
        }
    }

    /// The location a single-path assertion inspects.
    pub fn target_path(&self) -> Option<&KeyPath> {
        match self {
            Assertion::KeyExists(path)
            | Assertion::KeyNotExists(path)
            | Assertion::Value { path, .. } => Some(path),
            Assertion::ListDict(_) => None,
        }
    }

    /// Short description used in relation tags and logs.
    pub fn description(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assertion::KeyExists(path) => write!(f, "{path} exists"),
            Assertion::KeyNotExists(path) => write!(f, "{path} not exists"),
            Assertion::Value {
                path,
                operator,
                expected,
            } => write!(f, "{path} {operator} {expected}"),
            Assertion::ListDict(list) => list.fmt(f),
        }
    }
}

impl Assertable for Assertion {
    fn evaluate(&self, data: &JsonValue) -> Result<(), AssertionFailed> {
        match self {
            Assertion::KeyExists(path) => {
                let mut current = data;
                for segment in path.segments() {
                    match path::try_read(current, std::slice::from_ref(&segment)) {
                        Some(next) => current = next,
                        None => {
                            return Err(AssertionFailed::new(format!(
                                "Assertion failed: {segment} does not exist in {current}"
                            )))
                        }
                    }
                }
                Ok(())
            }
            Assertion::KeyNotExists(path) => match path::try_read(data, &path.segments()) {
                Some(_) => Err(AssertionFailed::new(format!(
                    "Assertion failed: {path} exists in {data}"
                ))),
                None => Ok(()),
            },
            Assertion::Value {
                path,
                operator,
                expected,
            } => {
                let actual = path::read(data, &path.segments()).map_err(|error| missing(path, &error))?;
                compare(&path.to_string(), actual, *operator, expected)
            }
            Assertion::ListDict(list) => list.evaluate(data),
        }
    }
}

fn missing(path: &KeyPath, error: &PathError) -> AssertionFailed {
    AssertionFailed::new(format!("Assertion failed: {path}: {error}"))
}

fn compare(
    label: &str,
    actual: &JsonValue,
    operator: Operator,
    expected: &JsonValue,
) -> Result<(), AssertionFailed> {
    if operator.apply(actual, expected) {
        Ok(())
    } else {
        Err(AssertionFailed::new(format!(
            "Assertion failed: {label}: expected {actual} {operator} {expected}"
        )))
    }
}

/// `quantifier(item[key] <operator> expected for item in data[path])`.
#[derive(Clone)]
pub struct ListDictAssertion {
    pub path: Vec<PathSegment>,
    pub key: KeyPath,
    pub quantifier: Quantifier,
    pub operator: Operator,
    pub expected: JsonValue,
    pub allow_empty: bool,
    transform: Option<ValueTransform>,
}

impl ListDictAssertion {
    pub fn new(
        path: Vec<PathSegment>,
        key: KeyPath,
        quantifier: Quantifier,
        operator: Operator,
        expected: impl Into<JsonValue>,
    ) -> Self {
        Self {
            path,
            key,
            quantifier,
            operator,
            expected: expected.into(),
            allow_empty: false,
            transform: None,
        }
    }

    /// An empty list passes instead of failing.
    pub fn allow_empty(mut self, allow_empty: bool) -> Self {
        self.allow_empty = allow_empty;
        self
    }

    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&JsonValue) -> JsonValue + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    fn label(&self) -> String {
        format!("{}[*].{}", render(&self.path), self.key)
    }

    fn evaluate(&self, data: &JsonValue) -> Result<(), AssertionFailed> {
        let list = path::read(data, &self.path)
            .map_err(|error| AssertionFailed::new(format!("Assertion failed: {}: {error}", self.label())))?;
        let Some(items) = list.as_array() else {
            return Err(AssertionFailed::new(format!(
                "Assertion failed: {} is not a list: {list}",
                render(&self.path)
            )));
        };
        if items.is_empty() {
            return if self.allow_empty {
                Ok(())
            } else {
                Err(AssertionFailed::new(format!(
                    "Assertion failed: {} is empty",
                    render(&self.path)
                )))
            };
        }

        let key = self.key.segments();
        let mut projected = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let value = path::read(item, &key).map_err(|error| {
                AssertionFailed::new(format!(
                    "Assertion failed: {}: item {index}: {error}",
                    self.label()
                ))
            })?;
            projected.push(match &self.transform {
                Some(transform) => transform(value),
                None => value.clone(),
            });
        }

        if self
            .quantifier
            .apply(&self.expected, self.operator, &projected)
        {
            Ok(())
        } else {
            Err(AssertionFailed::new(format!(
                "Assertion failed: {}: expected {} of {} {} {}",
                self.label(),
                self.quantifier,
                JsonValue::Array(projected),
                self.operator,
                self.expected
            )))
        }
    }
}

impl fmt::Debug for ListDictAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListDictAssertion")
            .field("path", &self.path)
            .field("key", &self.key)
            .field("quantifier", &self.quantifier)
            .field("operator", &self.operator)
            .field("expected", &self.expected)
            .field("allow_empty", &self.allow_empty)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

impl fmt::Display for ListDictAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.quantifier,
            self.label(),
            self.operator,
            self.expected
        )
    }
}

/// A predicate over a transport response.
#[derive(Clone, Debug)]
pub enum ResponseAssertion {
    /// The status code equals the expected one.
    StatusCode(u16),
    /// The first match of a JSON path satisfies the comparison; a missing
    /// path resolves to `null`.
    BodyValue {
        json_path: String,
        segments: Vec<PathSegment>,
        operator: Operator,
        expected: JsonValue,
    },
    /// A record assertion applied to the decoded body.
    Body(Assertion),
}

impl ResponseAssertion {
    pub fn status_code(expected: u16) -> Self {
        ResponseAssertion::StatusCode(expected)
    }

    /// Parses `json_path` (`$.data.id`, `data.id`, or `/data/id`).
    pub fn body_value(
        json_path: &str,
        operator: Operator,
        expected: impl Into<JsonValue>,
    ) -> Result<Self, PathError> {
        Ok(ResponseAssertion::BodyValue {
            json_path: json_path.to_string(),
            segments: path::parse_expression(json_path)?,
            operator,
            expected: expected.into(),
        })
    }

    pub fn body(assertion: Assertion) -> Self {
        ResponseAssertion::Body(assertion)
    }

    pub fn evaluate(&self, response: &Response) -> Result<(), AssertionFailed> {
        match self {
            ResponseAssertion::StatusCode(expected) => {
                if response.status_code == *expected {
                    Ok(())
                } else {
                    Err(AssertionFailed::new(format!(
                        "Assertion failed: invalid status code. Expected {expected}, but got {}.",
                        response.status_code
                    )))
                }
            }
            ResponseAssertion::BodyValue {
                json_path,
                segments,
                operator,
                expected,
            } => {
                let body = decoded(response)?;
                let actual = path::try_read(body, segments).unwrap_or(&JsonValue::Null);
                compare(json_path, actual, *operator, expected)
            }
            ResponseAssertion::Body(assertion) => assertion.evaluate(decoded(response)?),
        }
    }
}

impl fmt::Display for ResponseAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseAssertion::StatusCode(expected) => write!(f, "status == {expected}"),
            ResponseAssertion::BodyValue {
                json_path,
                operator,
                expected,
                ..
            } => write!(f, "{json_path} {operator} {expected}"),
            ResponseAssertion::Body(assertion) => assertion.fmt(f),
        }
    }
}

fn decoded(response: &Response) -> Result<&JsonValue, AssertionFailed> {
    match &response.body {
        ResponseBody::Json(value) => Ok(value),
        ResponseBody::Undecodable(_) => Err(AssertionFailed::new(INVALID_JSON_RESPONSE)),
    }
}

#[cfg(test)]
#[path = "../tests/internal/assertion_unit_tests.rs"]
mod tests;
