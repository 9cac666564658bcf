//! Error taxonomy for schema construction, generation, and evaluation.
//!
//! Configuration errors are fatal and surface at construction or first use.
//! Assertion failures are not errors of the generator; they are reported per
//! use case as [`AssertionFailed`] and never abort a suite.

use thiserror::Error;

use crate::fault::FaultKind;

/// Shared `Result` alias for the crate.
pub type Result<T> = std::result::Result<T, FaultlineError>;

/// Top-level error type folding every fallible concern of the crate.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum FaultlineError {
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Operator(#[from] OperatorError),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Relation(#[from] RelationError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Conformance(#[from] ConformanceError),
}

/// Field declarations that violate their own bounds.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("max_length ({max}) must be >= min_length ({min})")]
    InvertedLength { min: usize, max: usize },
    #[error("max_value ({max}) must be >= min_value ({min})")]
    InvertedValue { min: String, max: String },
    #[error("float bound must be finite, got {value}")]
    NonFiniteBound { value: f64 },
    #[error("choice field must declare at least one choice")]
    EmptyChoices,
    #[error("char field alphabet must not be empty")]
    EmptyAlphabet,
    #[error("prefix and suffix ({affix} chars) do not fit in max_length {max}")]
    AffixTooLong { affix: usize, max: usize },
    #[error("list field must declare at least one item field")]
    EmptyListItems,
    #[error("fixed list length {length} is outside [{min}, {max}]")]
    FixedLengthOutOfBounds { length: usize, min: usize, max: usize },
    #[error("duplicate field name '{name}'")]
    DuplicateField { name: String },
}

/// Invalid-value provider lookups and preconditions.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ProviderError {
    #[error("unknown fault kind '{0}'")]
    UnknownFaultKind(String),
    #[error("fault kind '{kind}' requires field {bound} to be set on '{field}'")]
    Precondition {
        kind: FaultKind,
        field: String,
        bound: &'static str,
    },
    #[error("fault kind '{kind}' has no representable value beyond the bound of '{field}'")]
    Unrepresentable { kind: FaultKind, field: String },
    #[error("fault kind '{kind}' does not apply to {field_type} field '{field}'")]
    NotApplicable {
        kind: FaultKind,
        field: String,
        field_type: &'static str,
    },
}

/// Operator and quantifier lookups.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum OperatorError {
    #[error("unsupported operator '{0}'")]
    UnsupportedOperator(String),
    #[error("unsupported quantifier '{0}'")]
    UnsupportedQuantifier(String),
}

/// Path navigation failures.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PathError {
    #[error("key '{segment}' missing at '{path}'")]
    KeyMissing { path: String, segment: String },
    #[error("value at '{path}' is not a container")]
    NotAContainer { path: String },
    #[error("path must contain at least one segment")]
    EmptyPath,
    #[error("invalid path expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },
}

/// Relation-constraint declarations that cannot be repaired.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RelationError {
    #[error("constraint '{0}' has no repair handler")]
    UnrepairableConstraint(String),
    #[error("no field declared at '{0}'")]
    UnknownField(String),
    #[error("no valid value of '{path}' satisfies '{constraint}'")]
    Unsatisfiable { path: String, constraint: String },
}

/// Failures of the seeded random source.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GenerationError {
    #[error("value generation rejected for {context}: {reason}")]
    Rejected { context: String, reason: String },
}

/// Configuration file problems.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {details}")]
    Read { path: String, details: String },
    #[error("invalid config: {0}")]
    Parse(String),
    #[error("unsupported config version {0}")]
    UnsupportedVersion(u32),
    #[error("invalid {name} range [{lo}, {hi}]")]
    InvalidRange {
        name: &'static str,
        lo: String,
        hi: String,
    },
}

/// JSON Schema export problems.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConformanceError {
    #[error("exported schema does not compile: {0}")]
    InvalidSchema(String),
}

/// A predicate that did not hold, with its rendered explanation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct AssertionFailed {
    /// Human-readable explanation naming the path, operator, and values.
    pub message: String,
}

impl AssertionFailed {
    /// Creates a failure from an explanation string.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
