use std::io;
use std::path::PathBuf;

/// Result alias used by the loading side of the simulator
pub type SimResult<T> = Result<T, SimError>;

/// Errors that stop a run before the first simulated instant
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unsupported scheduling strategy: {0:?}")]
    UnsupportedPolicy(String),

    #[error("Failed to read process file {path}: {source}")]
    ProcessFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Configuration file problems. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid integer for {key}: {value:?}")]
    InvalidInteger { key: String, value: String },

    #[error("unknown allocation policy: {0:?}")]
    UnknownAllocation(String),

    #[error("unknown replacement algorithm: {0:?}")]
    UnknownAlgorithm(String),

    #[error("{0} must be at least 1")]
    ZeroCapacity(&'static str),
}

/// Problems in a single line of the process file. The loader logs these and
/// skips the offending record or event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraceParseError {
    #[error("expected {expected} '/'-separated fields, got {found}")]
    MissingFields { expected: usize, found: usize },

    #[error("empty process id")]
    EmptyId,

    #[error("invalid {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("unknown event tag: {0:?}")]
    UnknownEvent(String),
}
