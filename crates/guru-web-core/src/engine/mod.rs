//! Adapters for the analysis engine that answers queries.
//!
//! The gate only sees the [`Engine`] capability. Two strategies back it:
//! [`LockedEngine`] runs a blocking, stateful [`Analyzer`] one query at a
//! time, [`SubprocessEngine`] starts a fresh engine process per query.

use async_trait::async_trait;

use crate::error::EngineError;
use crate::format::{OutputFormat, QueryReport};

pub mod child;
pub mod command;
pub mod locked;
pub mod subprocess;

pub use command::GuruCommand;
pub use locked::{Analyzer, BlockingGuru, LockedEngine};
pub use subprocess::SubprocessEngine;

/// A single query as the engine sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    /// Query mode such as `callers` or `describe`.
    pub mode: String,
    /// Engine-defined position, commonly `file:#start,#end`.
    pub pos: String,
    pub format: OutputFormat,
}

impl QueryRequest {
    pub fn new(mode: impl Into<String>, pos: impl Into<String>, format: OutputFormat) -> Self {
        Self {
            mode: mode.into(),
            pos: pos.into(),
            format,
        }
    }
}

#[async_trait]
pub trait Engine: Send + Sync {
    /// Answer one query.
    async fn query(&self, request: &QueryRequest) -> Result<Box<dyn QueryReport>, EngineError>;

    /// Command line that reproduces `request` outside the web session.
    fn command_line(&self, request: &QueryRequest) -> String;
}
