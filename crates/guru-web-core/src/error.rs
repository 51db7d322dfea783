use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Failure to map a (line, column) pair onto a byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("line and column are 1-indexed; got {line}.{col}")]
    ZeroIndex { line: usize, col: usize },
    #[error("no such line {line}: buffer has {lines} line(s)")]
    NoSuchLine { line: usize, lines: usize },
    #[error("position {line}.{col} lies beyond any addressable byte offset")]
    Overflow { line: usize, col: usize },
}

/// A selection string that is not of the form `startLine.startCol-endLine.endCol`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed selection {input:?}: {reason}")]
pub struct SelectionParseError {
    pub input: String,
    pub reason: &'static str,
}

/// Failures raised by an engine adapter while answering a query.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("engine exited with {status}: {stderr}")]
    Exit { status: ExitStatus, stderr: String },
    #[error("engine did not answer within {limit:?}")]
    Timeout { limit: Duration },
    #[error("engine i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Internal(String),
}

impl EngineError {
    /// Short label used as a metrics attribute.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Spawn { .. } => "spawn",
            EngineError::Exit { .. } => "exit",
            EngineError::Timeout { .. } => "timeout",
            EngineError::Io(_) => "io",
            EngineError::Internal(_) => "internal",
        }
    }
}

/// Rendering a report into the requested wire format failed.
#[derive(Debug, Error)]
#[error("failed to render result as {format}: {source}")]
pub struct FormatError {
    pub format: &'static str,
    #[source]
    pub source: serde_json::Error,
}

/// Outcome of a request rejected by the query gate.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },
    #[error("{path} is not part of the loaded scope")]
    ScopeViolation { path: String },
    #[error("{path} could not be read: {source}")]
    NotFound {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Format(#[from] FormatError),
}
