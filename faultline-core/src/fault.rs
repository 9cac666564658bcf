//! Fault kinds and the invalid records derived from them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::ProviderError;
use crate::path::KeyPath;

/// A named category of invalid input.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    MissingRequired,
    Null,
    Blank,
    ExceedMaxLength,
    ExceedMinLength,
    ExceedMaxValue,
    ExceedMinValue,
    InvalidChoice,
    InvalidType,
    InvalidNestedObject,
}

impl FaultKind {
    /// Every fault kind, in catalogue order.
    pub const ALL: [FaultKind; 10] = [
        FaultKind::MissingRequired,
        FaultKind::Null,
        FaultKind::Blank,
        FaultKind::ExceedMaxLength,
        FaultKind::ExceedMinLength,
        FaultKind::ExceedMaxValue,
        FaultKind::ExceedMinValue,
        FaultKind::InvalidChoice,
        FaultKind::InvalidType,
        FaultKind::InvalidNestedObject,
    ];

    /// The stable tag used in case names and assertion overrides.
    pub fn tag(self) -> &'static str {
        match self {
            FaultKind::MissingRequired => "missing_required",
            FaultKind::Null => "null",
            FaultKind::Blank => "blank",
            FaultKind::ExceedMaxLength => "exceed_max_length",
            FaultKind::ExceedMinLength => "exceed_min_length",
            FaultKind::ExceedMaxValue => "exceed_max_value",
            FaultKind::ExceedMinValue => "exceed_min_value",
            FaultKind::InvalidChoice => "invalid_choice",
            FaultKind::InvalidType => "invalid_type",
            FaultKind::InvalidNestedObject => "invalid_nested_object",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for FaultKind {
    type Err = ProviderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        FaultKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == value)
            .ok_or_else(|| ProviderError::UnknownFaultKind(value.to_string()))
    }
}

/// One invalid value derived from a field's bounds.
///
/// `sub_path` is set when the value is a whole nested object whose fault sits
/// at a sub-field (relative to the owning field).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvalidValue {
    pub value: JsonValue,
    pub kind: FaultKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_path: Option<KeyPath>,
}

impl InvalidValue {
    pub fn new(value: JsonValue, kind: FaultKind) -> Self {
        Self {
            value,
            kind,
            sub_path: None,
        }
    }

    pub fn nested(value: JsonValue, kind: FaultKind, sub_path: KeyPath) -> Self {
        Self {
            value,
            kind,
            sub_path: Some(sub_path),
        }
    }
}

/// What made an [`InvalidData`] record invalid.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Fault {
    /// A single-field mutation of the given kind.
    Field { kind: FaultKind },
    /// A relation constraint the record violates.
    Relation { description: String },
}

impl Fault {
    /// The tag used in case names and assertion overrides.
    pub fn tag(&self) -> String {
        match self {
            Fault::Field { kind } => kind.tag().to_string(),
            Fault::Relation { description } => description.clone(),
        }
    }

    /// The fault kind for single-field mutations.
    pub fn kind(&self) -> Option<FaultKind> {
        match self {
            Fault::Field { kind } => Some(*kind),
            Fault::Relation { .. } => None,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

/// An invalid record isolating one fault relative to the valid baseline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvalidData {
    /// The full record to send.
    pub data: JsonValue,
    /// The top-level (or final, for relations) key that carries the fault.
    pub field_name: String,
    /// Why the record is invalid.
    pub fault: Fault,
    /// Dotted path of the faulty location.
    pub whole_field_path: KeyPath,
}
