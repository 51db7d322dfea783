//! The single choke point for file reads and engine queries.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::time::Instant;

use crate::engine::{Engine, QueryRequest};
use crate::error::GateError;
use crate::format::QueryReport;
use crate::position::Selection;
use crate::scope::ScopeIndex;
use crate::telemetry;

/// Enforces the scope boundary in front of the file system and the engine.
#[derive(Clone)]
pub struct QueryGate {
    scope: Arc<ScopeIndex>,
    engine: Arc<dyn Engine>,
    verbose: bool,
}

impl QueryGate {
    pub fn new(scope: Arc<ScopeIndex>, engine: Arc<dyn Engine>) -> Self {
        Self {
            scope,
            engine,
            verbose: false,
        }
    }

    /// Log every query at `info` as the command line that reproduces it.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn scope(&self) -> &ScopeIndex {
        &self.scope
    }

    /// Reject `path` unless it is an exact scope member.
    pub fn check_scope(
        &self,
        path: &str,
        surface: &'static str,
        remote: Option<SocketAddr>,
    ) -> Result<(), GateError> {
        if self.scope.contains(path) {
            return Ok(());
        }
        tracing::warn!(?remote, path, surface, "rejected path outside scope");
        telemetry::record_scope_violation(surface);
        Err(GateError::ScopeViolation {
            path: path.to_string(),
        })
    }

    /// Raw content of an in-scope file.
    pub async fn serve_file_content(
        &self,
        path: &str,
        remote: Option<SocketAddr>,
    ) -> Result<Vec<u8>, GateError> {
        self.check_scope(path, "file", remote)?;
        tokio::fs::read(path).await.map_err(|source| {
            tracing::warn!(?remote, path, error = %source, "failed to read scope file");
            GateError::NotFound {
                path: path.to_string(),
                source,
            }
        })
    }

    /// Forward `request` to the engine once the file its position names
    /// passes the scope check.
    ///
    /// Neither the mode nor the position may look like a flag, and the
    /// position must name a file in one of the shapes `embedded_file`
    /// recognises.
    pub async fn run_query(
        &self,
        request: &QueryRequest,
        remote: Option<SocketAddr>,
    ) -> Result<Box<dyn QueryReport>, GateError> {
        let invalid = |reason: String| {
            tracing::warn!(?remote, mode = %request.mode, pos = %request.pos, %reason, "rejected query");
            GateError::InvalidQuery { reason }
        };
        if request.mode.starts_with('-') {
            return Err(invalid(format!("mode {:?} looks like a flag", request.mode)));
        }
        if request.pos.starts_with('-') {
            return Err(invalid(format!("position {:?} looks like a flag", request.pos)));
        }
        let Some(file) = embedded_file(&request.pos) else {
            return Err(invalid(format!(
                "position {:?} does not name a file",
                request.pos
            )));
        };
        self.check_scope(file, "query", remote)?;

        let command = self.engine.command_line(request);
        if self.verbose {
            tracing::info!(?remote, command = %command, "query");
        } else {
            tracing::debug!(?remote, command = %command, "query");
        }

        telemetry::record_query(&request.mode);
        let started = Instant::now();
        let result = self.engine.query(request).await;
        telemetry::record_query_latency(started.elapsed().as_millis() as u64);

        result.map_err(|err| {
            tracing::error!(?remote, command = %command, error = %err, "engine query failed");
            telemetry::record_query_failure(err.kind());
            GateError::Engine(err)
        })
    }
}

/// File named by an engine position such as `f.go:#10,#20`, `f.go:#10`,
/// `f.go:3:7` or `f.go:3.1-4.2`. `None` when no file can be recognised.
pub fn embedded_file(pos: &str) -> Option<&str> {
    let (head, tail) = pos.rsplit_once(':')?;
    let file = if tail.starts_with('#') || tail.parse::<Selection>().is_ok() {
        head
    } else if is_decimal(tail) {
        match head.rsplit_once(':') {
            Some((file, line)) if is_decimal(line) => file,
            _ => head,
        }
    } else {
        return None;
    };
    (!file.is_empty()).then_some(file)
}

fn is_decimal(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}
