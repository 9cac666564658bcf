//! Negative-test generation and JSON assertion engine.
//!
//! A [`Schema`] declares the fields an endpoint accepts. A [`Faker`] turns it
//! into one valid baseline record plus a catalogue of invalid records, each
//! differing from the baseline by exactly one fault. A [`UseCaseBinding`]
//! pairs those records with a request template and the response assertions
//! each case expects, and [`run_use_cases`] executes them through any
//! [`RequestSender`].

pub mod assertion;
pub mod config;
pub mod conformance;
pub mod error;
pub mod faker;
pub mod fault;
pub mod field;
pub mod operator;
pub mod path;
pub mod provider;
pub mod relation;
pub mod rng;
pub mod runner;
pub mod schema;
pub mod usecase;

pub use assertion::{
    Assertable, Assertion, ListDictAssertion, ResponseAssertion, ValueTransform,
    INVALID_JSON_RESPONSE,
};
pub use config::{default_faultline_toml, GenerationConfig};
pub use conformance::ConformanceChecker;
pub use error::{
    AssertionFailed, ConfigError, ConformanceError, FaultlineError, FieldError, GenerationError,
    OperatorError, PathError, ProviderError, RelationError, Result,
};
pub use faker::Faker;
pub use fault::{Fault, FaultKind, InvalidData, InvalidValue};
pub use field::{
    CharClass, CharSpec, ChoiceSpec, Field, FieldKind, FieldMap, FieldType, ListSpec,
    NumericBounds,
};
pub use operator::{Operator, Quantifier};
pub use path::{KeyPath, PathSegment, WriteMode};
pub use provider::{get_provider, InvalidValueProvider};
pub use relation::RelationConstraint;
pub use rng::GenContext;
pub use runner::{
    run_use_cases, CaseOutcome, RequestSender, Response, ResponseBody, RunnerOptions, SendFuture,
    SuiteReport, TransportError,
};
pub use schema::{Schema, SchemaBuilder};
pub use usecase::{AssertionBinding, ExpectedOutcome, RequestTemplate, UseCase, UseCaseBinding};
