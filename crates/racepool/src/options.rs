//! Pool options
//!
//! Options are a plain merge of caller-supplied fields over defaults
//! (`concurrency = 1`, `output = collect`). They can be built in code,
//! deserialized with missing fields, or read from the environment.

use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Environment variable holding the concurrency ceiling
pub const CONCURRENCY_ENV: &str = "RACEPOOL_CONCURRENCY";

/// Environment variable holding the output mode (`collect` or `stream`)
pub const OUTPUT_ENV: &str = "RACEPOOL_OUTPUT";

/// How results are handed back to the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Resolve once to every result, in input order
    #[default]
    Collect,
    /// Yield results one at a time, in completion order
    Stream,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Collect => write!(f, "collect"),
            OutputMode::Stream => write!(f, "stream"),
        }
    }
}

impl FromStr for OutputMode {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "collect" => Ok(OutputMode::Collect),
            "stream" => Ok(OutputMode::Stream),
            other => Err(OptionsError::UnknownOutputMode(other.to_string())),
        }
    }
}

/// Malformed or invalid options
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    /// Concurrency must be at least one
    #[error("concurrency must be a positive integer, got {0}")]
    InvalidConcurrency(usize),

    /// Output mode was not one of the known modes
    #[error("unknown output mode: {0:?} (expected \"collect\" or \"stream\")")]
    UnknownOutputMode(String),

    /// An environment variable held an unparseable value
    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Options for a single pool run
///
/// # Example
///
/// ```
/// use racepool::{OutputMode, PoolOptions};
///
/// let options = PoolOptions::new()
///     .with_concurrency(4)
///     .with_output(OutputMode::Stream);
///
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolOptions {
    /// Maximum number of operations in flight at once
    pub concurrency: usize,

    /// Output strategy
    pub output: OutputMode,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            output: OutputMode::Collect,
        }
    }
}

impl PoolOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the concurrency ceiling
    ///
    /// Zero is accepted here and rejected by [`validate`](Self::validate), so
    /// misuse is reported when the run is requested.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the output mode
    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    /// Validate the options
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.concurrency == 0 {
            return Err(OptionsError::InvalidConcurrency(self.concurrency));
        }
        Ok(())
    }

    /// Create options from environment variables
    ///
    /// Environment variables:
    /// - `RACEPOOL_CONCURRENCY`: positive integer (default: 1)
    /// - `RACEPOOL_OUTPUT`: `collect` or `stream` (default: collect)
    ///
    /// Unset variables fall back to defaults; set but malformed ones are errors.
    pub fn from_env() -> Result<Self, OptionsError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, OptionsError> {
        let mut options = Self::default();

        if let Some(value) = lookup(CONCURRENCY_ENV) {
            options.concurrency =
                value
                    .trim()
                    .parse()
                    .map_err(|_| OptionsError::InvalidEnv {
                        var: CONCURRENCY_ENV,
                        value: value.clone(),
                    })?;
        }

        if let Some(value) = lookup(OUTPUT_ENV) {
            options.output = value.parse()?;
        }

        options.validate()?;
        Ok(options)
    }
}
