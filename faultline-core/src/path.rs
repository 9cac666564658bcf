//! Path expressions and navigation over nested JSON values.
//!
//! Paths accept three spellings: dotted (`user.roles.0`), JSONPath-like
//! (`$.user.roles[0]`, `$['user']`) and JSON Pointer (`/user/roles/0`).

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use nonempty::NonEmpty;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::PathError;

static JSON_PATH_TOKEN: OnceLock<Regex> = OnceLock::new();

/// One step of a path.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl PathSegment {
    fn label(&self) -> String {
        match self {
            PathSegment::Key(key) => key.clone(),
            PathSegment::Index(index) => index.to_string(),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        PathSegment::Key(value.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(value: String) -> Self {
        PathSegment::Key(value)
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        PathSegment::Index(value)
    }
}

/// A non-empty sequence of segments addressing one location in a record.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyPath(NonEmpty<PathSegment>);

impl KeyPath {
    /// A single-segment path naming a top-level key.
    pub fn key(name: impl Into<String>) -> Self {
        Self(NonEmpty::new(PathSegment::Key(name.into())))
    }

    /// Builds a path from segments, failing when none are given.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        let segments = segments.into_iter().map(Into::into).collect::<Vec<_>>();
        NonEmpty::from_vec(segments)
            .map(Self)
            .ok_or(PathError::EmptyPath)
    }

    /// Parses a dotted, JSONPath-like, or JSON Pointer expression.
    pub fn parse(expression: &str) -> Result<Self, PathError> {
        let segments = parse_expression(expression)?;
        NonEmpty::from_vec(segments)
            .map(Self)
            .ok_or(PathError::EmptyPath)
    }

    /// Returns a new path with `segment` appended.
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Returns a new path with every segment of `suffix` appended.
    pub fn join(&self, suffix: &KeyPath) -> Self {
        let mut segments = self.0.clone();
        for segment in suffix.segments() {
            segments.push(segment);
        }
        Self(segments)
    }

    /// The first segment, naming the top-level field.
    pub fn head(&self) -> &PathSegment {
        &self.0.head
    }

    /// The final segment.
    pub fn last(&self) -> &PathSegment {
        self.0.last()
    }

    /// Segments before the final one.
    pub fn parent_segments(&self) -> Vec<PathSegment> {
        let segments = self.segments();
        segments[..segments.len() - 1].to_vec()
    }

    /// Every segment in order.
    pub fn segments(&self) -> Vec<PathSegment> {
        self.0.iter().cloned().collect()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; present for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Dotted rendering used in use-case names and assertion overrides.
    pub fn dotted(&self) -> String {
        self.0
            .iter()
            .map(PathSegment::label)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

impl FromStr for KeyPath {
    type Err = PathError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        KeyPath::parse(value)
    }
}

impl TryFrom<String> for KeyPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        KeyPath::parse(&value)
    }
}

impl From<KeyPath> for String {
    fn from(value: KeyPath) -> Self {
        value.dotted()
    }
}

/// Whether writes may create missing intermediate objects.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriteMode {
    /// Every parent must already exist.
    Existing,
    /// Missing (or null) parents are created as empty objects.
    CreateParents,
}

/// Parses a path expression into segments; `$` and the empty string address the root.
pub fn parse_expression(expression: &str) -> Result<Vec<PathSegment>, PathError> {
    let trimmed = expression.trim();
    if trimmed.is_empty() || trimmed == "$" || trimmed == "/" {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('/') {
        return Ok(path_from_pointer(trimmed));
    }

    let body = trimmed.strip_prefix('$').unwrap_or(trimmed);
    let normalized = if body.starts_with('.') || body.starts_with('[') {
        body.to_string()
    } else {
        format!(".{body}")
    };

    let token = JSON_PATH_TOKEN.get_or_init(|| {
        Regex::new(r#"\.([^.\[\]]+)|\[(\d+)\]|\[['"]([^'"]*)['"]\]"#).expect("static path regex")
    });

    let mut segments = Vec::new();
    let mut consumed = 0;
    for captures in token.captures_iter(&normalized) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        if whole.start() != consumed {
            return Err(invalid_expression(expression, consumed));
        }
        consumed = whole.end();
        if let Some(key) = captures.get(1) {
            segments.push(segment_from_text(key.as_str()));
        } else if let Some(index) = captures.get(2) {
            let index = index
                .as_str()
                .parse::<usize>()
                .map_err(|error| PathError::InvalidExpression {
                    expression: expression.to_string(),
                    reason: error.to_string(),
                })?;
            segments.push(PathSegment::Index(index));
        } else if let Some(key) = captures.get(3) {
            segments.push(PathSegment::Key(key.as_str().to_string()));
        }
    }
    if consumed != normalized.len() {
        return Err(invalid_expression(expression, consumed));
    }
    Ok(segments)
}

fn invalid_expression(expression: &str, offset: usize) -> PathError {
    PathError::InvalidExpression {
        expression: expression.to_string(),
        reason: format!("unexpected input at offset {offset}"),
    }
}

/// Only canonical decimal text (`7`, not `007` or `+7`) becomes an index.
fn segment_from_text(text: &str) -> PathSegment {
    match text.parse::<usize>() {
        Ok(index) if index.to_string() == text => PathSegment::Index(index),
        _ => PathSegment::Key(text.to_string()),
    }
}

/// Splits a JSON Pointer into segments, decoding `~0` and `~1`.
pub fn path_from_pointer(pointer: &str) -> Vec<PathSegment> {
    if pointer.is_empty() {
        return Vec::new();
    }

    pointer
        .split('/')
        .skip(1)
        .map(decode_pointer_segment)
        .map(|segment| segment_from_text(&segment))
        .collect()
}

fn decode_pointer_segment(segment: &str) -> String {
    let mut decoded = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(ch) = chars.next() {
        if ch == '~' {
            match chars.next() {
                Some('0') => decoded.push('~'),
                Some('1') => decoded.push('/'),
                Some(other) => {
                    decoded.push('~');
                    decoded.push(other);
                }
                None => decoded.push('~'),
            }
        } else {
            decoded.push(ch);
        }
    }
    decoded
}

pub(crate) fn render(segments: &[PathSegment]) -> String {
    if segments.is_empty() {
        return "$".to_string();
    }
    segments
        .iter()
        .map(PathSegment::label)
        .collect::<Vec<_>>()
        .join(".")
}

fn step<'a>(value: &'a JsonValue, segment: &PathSegment) -> Option<&'a JsonValue> {
    match (value, segment) {
        (JsonValue::Object(map), PathSegment::Key(key)) => map.get(key),
        (JsonValue::Object(map), PathSegment::Index(index)) => map.get(&index.to_string()),
        (JsonValue::Array(items), PathSegment::Index(index)) => items.get(*index),
        _ => None,
    }
}

fn step_mut<'a>(value: &'a mut JsonValue, segment: &PathSegment) -> Option<&'a mut JsonValue> {
    match (value, segment) {
        (JsonValue::Object(map), PathSegment::Key(key)) => map.get_mut(key),
        (JsonValue::Object(map), PathSegment::Index(index)) => map.get_mut(&index.to_string()),
        (JsonValue::Array(items), PathSegment::Index(index)) => items.get_mut(*index),
        _ => None,
    }
}

/// Resolves `path` against `data`, failing at the first missing segment.
pub fn read<'a>(data: &'a JsonValue, path: &[PathSegment]) -> Result<&'a JsonValue, PathError> {
    let mut current = data;
    for (depth, segment) in path.iter().enumerate() {
        current = step(current, segment).ok_or_else(|| PathError::KeyMissing {
            path: render(&path[..depth]),
            segment: segment.label(),
        })?;
    }
    Ok(current)
}

/// Resolves `path` against `data`, returning `None` when any segment is missing.
pub fn try_read<'a>(data: &'a JsonValue, path: &[PathSegment]) -> Option<&'a JsonValue> {
    read(data, path).ok()
}

/// Returns a copy of `data` with `value` stored at `path`.
pub fn write(
    data: &JsonValue,
    path: &KeyPath,
    value: JsonValue,
    mode: WriteMode,
) -> Result<JsonValue, PathError> {
    let mut copy = data.clone();
    write_in_place(&mut copy, path, value, mode)?;
    Ok(copy)
}

/// Returns a copy of `data` with the final key of `path` removed.
pub fn delete(data: &JsonValue, path: &KeyPath) -> Result<JsonValue, PathError> {
    let mut copy = data.clone();
    delete_in_place(&mut copy, path)?;
    Ok(copy)
}

pub(crate) fn write_in_place(
    data: &mut JsonValue,
    path: &KeyPath,
    value: JsonValue,
    mode: WriteMode,
) -> Result<(), PathError> {
    let parents = path.parent_segments();
    let parent = descend_mut(data, &parents, mode)?;
    let last = path.last();
    match (parent, last) {
        (JsonValue::Object(map), segment) => {
            map.insert(segment.label(), value);
            Ok(())
        }
        (JsonValue::Array(items), PathSegment::Index(index)) => {
            if *index < items.len() {
                items[*index] = value;
                Ok(())
            } else if *index == items.len() && mode == WriteMode::CreateParents {
                items.push(value);
                Ok(())
            } else {
                Err(PathError::KeyMissing {
                    path: render(&parents),
                    segment: index.to_string(),
                })
            }
        }
        _ => Err(PathError::NotAContainer {
            path: render(&parents),
        }),
    }
}

pub(crate) fn delete_in_place(data: &mut JsonValue, path: &KeyPath) -> Result<JsonValue, PathError> {
    let parents = path.parent_segments();
    let parent = descend_mut(data, &parents, WriteMode::Existing)?;
    let missing = || PathError::KeyMissing {
        path: render(&parents),
        segment: path.last().label(),
    };
    match (parent, path.last()) {
        (JsonValue::Object(map), segment) => map.remove(&segment.label()).ok_or_else(missing),
        (JsonValue::Array(items), PathSegment::Index(index)) if *index < items.len() => {
            Ok(items.remove(*index))
        }
        (JsonValue::Array(_), _) => Err(missing()),
        _ => Err(PathError::NotAContainer {
            path: render(&parents),
        }),
    }
}

fn descend_mut<'a>(
    data: &'a mut JsonValue,
    segments: &[PathSegment],
    mode: WriteMode,
) -> Result<&'a mut JsonValue, PathError> {
    let mut current = data;
    for (depth, segment) in segments.iter().enumerate() {
        if mode == WriteMode::CreateParents {
            if current.is_null() {
                *current = JsonValue::Object(JsonMap::new());
            }
            if let JsonValue::Object(map) = current {
                map.entry(segment.label())
                    .or_insert_with(|| JsonValue::Object(JsonMap::new()));
            }
        }
        let here = render(&segments[..depth]);
        current = match step_mut(current, segment) {
            Some(next) => next,
            None => {
                return Err(PathError::KeyMissing {
                    path: here,
                    segment: segment.label(),
                })
            }
        };
    }
    Ok(current)
}

#[cfg(test)]
#[path = "../tests/internal/path_unit_tests.rs"]
mod tests;
