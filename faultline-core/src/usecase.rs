//! Binds generated records to request templates and expected assertions.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::assertion::ResponseAssertion;
use crate::error::Result;
use crate::faker::Faker;
use crate::fault::{Fault, FaultKind, InvalidData};
use crate::path::KeyPath;

/// The request every generated record is sent with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestTemplate {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: JsonValue,
}

impl RequestTemplate {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: BTreeMap::new(),
            body: JsonValue::Null,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// A copy of this template carrying `body`.
    pub fn with_body(&self, body: JsonValue) -> Self {
        Self {
            body,
            ..self.clone()
        }
    }

    fn label(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

/// Whether the system under test should accept the request.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedOutcome {
    Accept,
    Reject,
}

impl fmt::Display for ExpectedOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedOutcome::Accept => f.write_str("accept"),
            ExpectedOutcome::Reject => f.write_str("reject"),
        }
    }
}

/// One executable case: a named request plus the assertions its response must pass.
#[derive(Clone, Debug)]
pub struct UseCase {
    pub name: String,
    pub request: RequestTemplate,
    pub assertions: Vec<ResponseAssertion>,
    pub expected: ExpectedOutcome,
    /// The fault the request carries; `None` for the valid case.
    pub fault: Option<Fault>,
    pub whole_field_path: Option<KeyPath>,
}

/// Which response assertions each generated case expects.
///
/// Invalid cases look up `(whole field path, fault tag)` first and fall back
/// to the default invalid set.
#[derive(Clone, Debug, Default)]
pub struct AssertionBinding {
    valid: Vec<ResponseAssertion>,
    default_invalid: Vec<ResponseAssertion>,
    overrides: BTreeMap<(KeyPath, String), Vec<ResponseAssertion>>,
}

impl AssertionBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_valid(mut self, assertions: Vec<ResponseAssertion>) -> Self {
        self.valid = assertions;
        self
    }

    pub fn with_default_invalid(mut self, assertions: Vec<ResponseAssertion>) -> Self {
        self.default_invalid = assertions;
        self
    }

    /// Assertions for the field-level fault `kind` at `path`.
    pub fn with_override(
        mut self,
        path: KeyPath,
        kind: FaultKind,
        assertions: Vec<ResponseAssertion>,
    ) -> Self {
        self.overrides
            .insert((path, kind.tag().to_string()), assertions);
        self
    }

    /// Assertions for a relation case, keyed by its description tag.
    pub fn with_relation_override(
        mut self,
        path: KeyPath,
        description: impl Into<String>,
        assertions: Vec<ResponseAssertion>,
    ) -> Self {
        self.overrides.insert((path, description.into()), assertions);
        self
    }

    pub fn valid(&self) -> &[ResponseAssertion] {
        &self.valid
    }

    /// The assertions expected for an invalid case.
    pub fn invalid_for(&self, path: &KeyPath, fault: &Fault) -> &[ResponseAssertion] {
        self.overrides
            .get(&(path.clone(), fault.tag()))
            .unwrap_or(&self.default_invalid)
    }
}

/// A request template with its assertion binding.
#[derive(Clone, Debug)]
pub struct UseCaseBinding {
    template: RequestTemplate,
    assertions: AssertionBinding,
}

impl UseCaseBinding {
    pub fn new(template: RequestTemplate, assertions: AssertionBinding) -> Self {
        Self {
            template,
            assertions,
        }
    }

    pub fn template(&self) -> &RequestTemplate {
        &self.template
    }

    /// The valid case followed by one case per invalid record.
    pub fn use_cases(&self, faker: &mut Faker) -> Result<Vec<UseCase>> {
        let baseline = faker.valid_record()?.clone();
        let invalid = faker.invalid_records()?;
        let mut cases = Vec::with_capacity(invalid.len() + 1);
        cases.push(UseCase {
            name: format!("<{} | valid>", self.template.label()),
            request: self.template.with_body(baseline),
            assertions: self.assertions.valid().to_vec(),
            expected: ExpectedOutcome::Accept,
            fault: None,
            whole_field_path: None,
        });
        cases.extend(invalid.into_iter().map(|record| self.invalid_case(record)));
        debug!(
            endpoint = %self.template.label(),
            cases = cases.len(),
            "bound use cases"
        );
        Ok(cases)
    }

    fn invalid_case(&self, record: InvalidData) -> UseCase {
        let InvalidData {
            data,
            fault,
            whole_field_path,
            ..
        } = record;
        UseCase {
            name: case_name(&self.template, &whole_field_path, &fault),
            request: self.template.with_body(data),
            assertions: self
                .assertions
                .invalid_for(&whole_field_path, &fault)
                .to_vec(),
            expected: ExpectedOutcome::Reject,
            fault: Some(fault),
            whole_field_path: Some(whole_field_path),
        }
    }
}

/// `<METHOD URL | path | fault>`
pub fn case_name(template: &RequestTemplate, path: &KeyPath, fault: &Fault) -> String {
    format!("<{} | {path} | {fault}>", template.label())
}

#[cfg(test)]
#[path = "../tests/internal/usecase_unit_tests.rs"]
mod tests;
