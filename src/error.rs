//! Error types shared by every stage of the locator.

use std::fmt;

use thiserror::Error;

/// Errors raised while building the feeder model or locating a fault.
#[derive(Error, Debug)]
pub enum LocatorError {
    /// A line identifier is absent from the topology or the line table.
    #[error("unknown line `{0}`")]
    UnknownLine(String),

    /// A line references a line code the circuit model does not define.
    #[error("line `{line}` references unknown line code `{code}`")]
    UnknownLineCode { line: String, code: String },

    /// A line code's matrices cannot be mapped onto the line's phases.
    #[error("line code `{code}` on line `{line}`: {message}")]
    InvalidLineCode {
        line: String,
        code: String,
        message: String,
    },

    /// The fault-type code has no reactance formula.
    #[error("undefined apparent reactance for fault type `{0}`")]
    UndefinedReactance(String),

    /// A 3x3 impedance matrix could not be inverted.
    #[error("singular impedance matrix ({context})")]
    Singular { context: String },

    /// A divisor fell below the configured threshold.
    #[error("near-zero divisor in {quantity} ({value:e})")]
    Numerical { quantity: String, value: f64 },

    /// A record or table column is missing or malformed.
    #[error("record {record}: column `{column}`: {message}")]
    Schema {
        record: usize,
        column: String,
        message: String,
    },

    /// Bus or phase notation that cannot be parsed.
    #[error("invalid bus spec `{0}`")]
    InvalidBus(String),

    /// The feeder graph violates a structural invariant.
    #[error("topology error: {0}")]
    Topology(String),

    /// Disambiguation was asked to choose among zero estimates.
    #[error("no candidate estimates to choose from")]
    NoCandidates,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, LocatorError>;

/// A failure isolated to one fault record, optionally to one candidate path.
#[derive(Debug)]
pub struct RecordFailure {
    /// Zero-based record index in the input table.
    pub record: usize,
    /// Zero-based candidate path index, when the failure is path specific.
    pub path: Option<usize>,
    pub error: LocatorError,
}

impl fmt::Display for RecordFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.path {
            Some(p) => write!(f, "record {}, path {}: {}", self.record, p + 1, self.error),
            None => write!(f, "record {}: {}", self.record, self.error),
        }
    }
}

impl std::error::Error for RecordFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
