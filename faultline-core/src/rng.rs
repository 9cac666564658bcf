//! Seeded random source shared by valid-value synthesis and providers.

use proptest::strategy::{Strategy, ValueTree};
use proptest::test_runner::{Config as ProptestConfig, RngAlgorithm, TestRng, TestRunner};
use serde_json::{Number, Value as JsonValue};

use crate::error::GenerationError;

/// Letters and digits, the default alphabet for generated strings.
pub const ALPHANUMERIC: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Deterministic sampling context: the same seed yields the same sequence of values.
pub struct GenContext {
    runner: TestRunner,
    seed: u64,
}

impl GenContext {
    /// Creates a context whose ChaCha stream is derived from `seed`.
    pub fn from_seed(seed: u64) -> Self {
        let mut bytes = [0u8; 32];
        for (index, chunk) in bytes.chunks_mut(8).enumerate() {
            chunk.copy_from_slice(&seed.rotate_left(index as u32 * 16).to_le_bytes());
        }
        let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &bytes);
        let config = ProptestConfig {
            failure_persistence: None,
            ..ProptestConfig::default()
        };
        Self {
            runner: TestRunner::new_with_rng(config, rng),
            seed,
        }
    }

    /// The seed this context was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draws one value from `strategy`.
    pub fn sample<S>(&mut self, context: &str, strategy: S) -> Result<S::Value, GenerationError>
    where
        S: Strategy,
    {
        strategy
            .new_tree(&mut self.runner)
            .map(|tree| tree.current())
            .map_err(|reason| GenerationError::Rejected {
                context: context.to_string(),
                reason: reason.to_string(),
            })
    }

    /// A string of exactly `length` characters drawn from `alphabet`.
    pub fn string(&mut self, length: usize, alphabet: &[char]) -> Result<String, GenerationError> {
        if length == 0 {
            return Ok(String::new());
        }
        if alphabet.is_empty() {
            return Err(GenerationError::Rejected {
                context: "string".to_string(),
                reason: "alphabet is empty".to_string(),
            });
        }
        let chars = proptest::collection::vec(proptest::sample::select(alphabet.to_vec()), length);
        Ok(self.sample("string", chars)?.into_iter().collect())
    }

    /// An alphanumeric string of exactly `length` characters.
    pub fn alphanumeric(&mut self, length: usize) -> Result<String, GenerationError> {
        let alphabet = ALPHANUMERIC.chars().collect::<Vec<_>>();
        self.string(length, &alphabet)
    }

    /// An integer in `low..=high`.
    pub fn integer(&mut self, low: i64, high: i64) -> Result<i64, GenerationError> {
        self.sample("integer", low..=high)
    }

    /// A float in `low..=high` rounded to `precision` decimal digits.
    pub fn float(&mut self, low: f64, high: f64, precision: u32) -> Result<f64, GenerationError> {
        if low == high {
            return Ok(low);
        }
        let raw = self.sample("float", low..=high)?;
        let scale = 10f64.powi(precision as i32);
        let rounded = (raw * scale).round() / scale;
        Ok(rounded.clamp(low, high))
    }

    /// A uniformly chosen element of `items`.
    pub fn choose<T>(&mut self, items: &[T]) -> Result<T, GenerationError>
    where
        T: Clone + std::fmt::Debug + 'static,
    {
        if items.is_empty() {
            return Err(GenerationError::Rejected {
                context: "choice".to_string(),
                reason: "no items to choose from".to_string(),
            });
        }
        self.sample("choice", proptest::sample::select(items.to_vec()))
    }

    /// A fair coin.
    pub fn boolean(&mut self) -> Result<bool, GenerationError> {
        self.sample("boolean", proptest::bool::ANY)
    }
}

impl std::fmt::Debug for GenContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenContext").field("seed", &self.seed).finish()
    }
}

/// Converts a float to JSON, mapping non-finite values to `null`.
pub(crate) fn float_value(value: f64) -> JsonValue {
    Number::from_f64(value)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}
