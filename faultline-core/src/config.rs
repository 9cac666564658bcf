use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_FAULTLINE_TOML: &str = include_str!("default_faultline.toml");

fn default_version() -> u32 {
    1
}

fn default_integer_range() -> [i64; 2] {
    [-1000, 1000]
}

fn default_float_range() -> [f64; 2] {
    [-1000.0, 1000.0]
}

fn default_float_precision() -> u32 {
    2
}

fn default_random_string_length() -> usize {
    10
}

fn default_list_item_limit() -> usize {
    10
}

/// Knobs for valid-value synthesis and fault enumeration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// Config format version; only `1` is accepted.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Seed for the random source.
    #[serde(default)]
    pub seed: u64,
    /// Inclusive range for integer fields without bounds.
    #[serde(default = "default_integer_range")]
    pub integer_range: [i64; 2],
    /// Inclusive range for float fields without bounds.
    #[serde(default = "default_float_range")]
    pub float_range: [f64; 2],
    /// Decimal digits kept on generated floats.
    #[serde(default = "default_float_precision")]
    pub float_precision: u32,
    /// Length of random strings sampled for invalid choices.
    #[serde(default = "default_random_string_length")]
    pub random_string_length: usize,
    /// Register the invalid-type provider on every field.
    #[serde(default)]
    pub type_faults: bool,
    /// Item ceiling for list fields without a max length.
    #[serde(default = "default_list_item_limit")]
    pub list_item_limit: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            seed: 0,
            integer_range: default_integer_range(),
            float_range: default_float_range(),
            float_precision: default_float_precision(),
            random_string_length: default_random_string_length(),
            type_faults: false,
            list_item_limit: default_list_item_limit(),
        }
    }
}

impl GenerationConfig {
    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enables or disables invalid-type faults on every field.
    pub fn with_type_faults(mut self, enabled: bool) -> Self {
        self.type_faults = enabled;
        self
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: GenerationConfig =
            toml::from_str(contents).map_err(|error| ConfigError::Parse(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|error| ConfigError::Read {
            path: path.display().to_string(),
            details: error.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Checks version and range consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::UnsupportedVersion(self.version));
        }
        let [lo, hi] = self.integer_range;
        if lo > hi {
            return Err(ConfigError::InvalidRange {
                name: "integer",
                lo: lo.to_string(),
                hi: hi.to_string(),
            });
        }
        let [lo, hi] = self.float_range;
        if !lo.is_finite() || !hi.is_finite() || lo > hi {
            return Err(ConfigError::InvalidRange {
                name: "float",
                lo: lo.to_string(),
                hi: hi.to_string(),
            });
        }
        if self.random_string_length == 0 {
            return Err(ConfigError::InvalidRange {
                name: "random_string_length",
                lo: "1".to_string(),
                hi: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// The embedded default configuration document.
pub fn default_faultline_toml() -> &'static str {
    DEFAULT_FAULTLINE_TOML
}

#[cfg(test)]
#[path = "../tests/internal/config_unit_tests.rs"]
mod tests;
