use std::path::PathBuf;
use thiserror::Error;

/// Rejected user input. The message is shown next to the offending field
/// in the TUI and printed as-is by the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("The {kind} name is missing")]
    Empty { kind: &'static str },

    #[error("The {kind} name '{name}' contains invalid characters")]
    InvalidCharacters { kind: &'static str, name: String },

    #[error("A {kind} named '{name}' already exists")]
    Duplicate { kind: &'static str, name: String },

    #[error("The {kind} value is missing")]
    MissingValue { kind: &'static str },

    #[error("Unknown destination '{0}'")]
    UnknownDestination(String),

    #[error("Unknown service '{0}'")]
    UnknownService(String),

    #[error("Unknown destination type '{0}'")]
    UnknownDestinationType(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    #[error("'{0}' is already present")]
    Duplicate(String),

    #[error("stale row reference #{0}")]
    StaleRow(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("missing value for argument '{field}'")]
    MissingField { field: String },

    #[error("malformed command template at position {position}")]
    Malformed { position: usize },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to replace {path} while trying to {step}: {source}")]
    Replace {
        path: PathBuf,
        step: &'static str,
        source: std::io::Error,
    },

    #[error("Malformed line {line} in {path}: {content}")]
    Parse {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("Group '{0}' does not exist")]
    UnknownGroup(String),

    #[error("Host '{0}' does not exist")]
    UnknownHost(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Collection(#[from] CollectionError),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("Process #{0} does not exist")]
    UnknownProcess(u64),

    #[error("Process #{0} is not running")]
    NotRunning(u64),

    #[error("Failed to signal process {pid}: {reason}")]
    Signal { pid: u32, reason: String },
}
