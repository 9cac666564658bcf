//! Executes bound use cases through a caller-supplied transport.
//!
//! The runner never aborts a suite: transport errors, timeouts, and assertion
//! failures become failure reasons on the case that produced them.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, warn};

use crate::usecase::{ExpectedOutcome, RequestTemplate, UseCase};

/// Boxed future returned by [`RequestSender::send`].
pub type SendFuture<'a> = Pin<Box<dyn Future<Output = Result<Response, TransportError>> + Send + 'a>>;

/// Sends one request and returns the response.
pub trait RequestSender {
    fn send<'a>(&'a self, request: &'a RequestTemplate) -> SendFuture<'a>;
}

/// Transport failure surfaced by a [`RequestSender`].
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body as received.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResponseBody {
    Json(JsonValue),
    /// Raw text of a body that is not JSON.
    Undecodable(String),
}

/// Status code and body of one response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status_code: u16,
    pub body: ResponseBody,
}

impl Response {
    pub fn json(status_code: u16, body: JsonValue) -> Self {
        Self {
            status_code,
            body: ResponseBody::Json(body),
        }
    }

    pub fn undecodable(status_code: u16, raw: impl Into<String>) -> Self {
        Self {
            status_code,
            body: ResponseBody::Undecodable(raw.into()),
        }
    }

    /// Decodes `bytes` as JSON, keeping the raw text when decoding fails.
    pub fn from_bytes(status_code: u16, bytes: &[u8]) -> Self {
        match serde_json::from_slice(bytes) {
            Ok(value) => Self::json(status_code, value),
            Err(_) => Self::undecodable(status_code, String::from_utf8_lossy(bytes)),
        }
    }
}

/// Execution knobs.
#[derive(Clone, Debug, Default)]
pub struct RunnerOptions {
    /// Upper bound for one request; `None` waits indefinitely.
    pub case_timeout: Option<Duration>,
}

/// Result of one use case.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaseOutcome {
    pub name: String,
    pub expected: ExpectedOutcome,
    pub passed: bool,
    pub failures: Vec<String>,
    pub response: Option<Response>,
}

/// Per-case outcomes of a suite, in execution order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SuiteReport {
    pub outcomes: Vec<CaseOutcome>,
}

impl SuiteReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed(&self) -> Vec<&CaseOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| !outcome.passed)
            .collect()
    }

    /// `1 - failed / total`; an empty suite has a pass rate of 0.
    pub fn pass_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        1.0 - self.failed().len() as f64 / self.outcomes.len() as f64
    }
}

/// Runs every case in order and collects the outcomes.
pub async fn run_use_cases<S>(sender: &S, cases: &[UseCase], options: &RunnerOptions) -> SuiteReport
where
    S: RequestSender + ?Sized,
{
    let mut report = SuiteReport::default();
    for case in cases {
        debug!(case = %case.name, "running use case");
        let outcome = run_case(sender, case, options).await;
        if outcome.passed {
            debug!(case = %case.name, "use case passed");
        } else {
            warn!(case = %case.name, failures = ?outcome.failures, "use case failed");
        }
        report.outcomes.push(outcome);
    }
    report
}

async fn run_case<S>(sender: &S, case: &UseCase, options: &RunnerOptions) -> CaseOutcome
where
    S: RequestSender + ?Sized,
{
    let sent = match options.case_timeout {
        Some(limit) => match tokio::time::timeout(limit, sender.send(&case.request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::new(format!(
                "request timed out after {} ms",
                limit.as_millis()
            ))),
        },
        None => sender.send(&case.request).await,
    };

    let (failures, response) = match sent {
        Ok(response) => {
            let failures = case
                .assertions
                .iter()
                .filter_map(|assertion| assertion.evaluate(&response).err())
                .map(|failure| failure.message)
                .collect();
            (failures, Some(response))
        }
        Err(error) => (vec![format!("transport error: {error}")], None),
    };
    CaseOutcome {
        name: case.name.clone(),
        expected: case.expected,
        passed: failures.is_empty(),
        failures,
        response,
    }
}

#[cfg(test)]
#[path = "../tests/internal/runner_unit_tests.rs"]
mod tests;
