use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::EngineError;
use crate::format::{QueryReport, RawReport};

use super::{Engine, GuruCommand, QueryRequest};

/// A blocking engine that may keep state between queries and is not trusted
/// with concurrent use.
pub trait Analyzer: Send + 'static {
    fn query(&mut self, request: &QueryRequest) -> Result<Box<dyn QueryReport>, EngineError>;
}

/// Serializes every query against a shared [`Analyzer`].
///
/// The lock is held for the duration of the analyzer call only; it is
/// released before the caller renders the report. Waiters are not ordered.
pub struct LockedEngine<A> {
    analyzer: Arc<Mutex<A>>,
    command: GuruCommand,
}

impl<A: Analyzer> LockedEngine<A> {
    /// `command` is the stand-alone invocation equivalent to a query against
    /// `analyzer`; it is only used to describe queries in logs.
    pub fn new(analyzer: A, command: GuruCommand) -> Self {
        Self {
            analyzer: Arc::new(Mutex::new(analyzer)),
            command,
        }
    }
}

#[async_trait]
impl<A: Analyzer> Engine for LockedEngine<A> {
    async fn query(&self, request: &QueryRequest) -> Result<Box<dyn QueryReport>, EngineError> {
        let analyzer = Arc::clone(&self.analyzer);
        let request = request.clone();
        tokio::task::spawn_blocking(move || {
            // Poisoned by a panic in an earlier query; the analyzer stays in service.
            let mut analyzer = analyzer.lock().unwrap_or_else(PoisonError::into_inner);
            analyzer.query(&request)
        })
        .await
        .map_err(|err| EngineError::Internal(format!("engine task failed: {err}")))?
    }

    fn command_line(&self, request: &QueryRequest) -> String {
        self.command.command_line(request)
    }
}

/// Runs `guru` synchronously; paired with [`LockedEngine`] this lets at most
/// one engine process exist at any time.
#[derive(Clone, Debug)]
pub struct BlockingGuru {
    command: GuruCommand,
}

impl BlockingGuru {
    pub fn new(command: GuruCommand) -> Self {
        Self { command }
    }
}

impl Analyzer for BlockingGuru {
    fn query(&mut self, request: &QueryRequest) -> Result<Box<dyn QueryReport>, EngineError> {
        let output = self
            .command
            .std_command(request)
            .stdin(std::process::Stdio::null())
            .output()
            .map_err(|source| EngineError::Spawn {
                program: self.command.program().to_string(),
                source,
            })?;
        if !output.status.success() {
            return Err(EngineError::Exit {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(Box::new(RawReport::new(output.stdout)))
    }
}
