use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::time::timeout;

use crate::error::EngineError;
use crate::format::{QueryReport, RawReport};

use super::child::ChildGuard;
use super::{Engine, GuruCommand, QueryRequest};

/// Runs one engine process per query and captures its standard output.
///
/// Processes share nothing, so queries run concurrently.
#[derive(Clone, Debug)]
pub struct SubprocessEngine {
    command: GuruCommand,
    timeout: Option<Duration>,
}

impl SubprocessEngine {
    pub fn new(command: GuruCommand) -> Self {
        Self {
            command,
            timeout: None,
        }
    }

    /// Abort queries that run longer than `limit`; the child is killed.
    pub fn with_timeout(mut self, limit: Option<Duration>) -> Self {
        self.timeout = limit;
        self
    }

    async fn run(&self, request: &QueryRequest) -> Result<Vec<u8>, EngineError> {
        let mut cmd = self.command.tokio_command(request);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut guard = ChildGuard::spawn(&mut cmd, self.command.program())?;
        let child = guard.child_mut();
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Internal("engine did not produce stdout pipe".into()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::Internal("engine did not produce stderr pipe".into()))?;

        let collect = async {
            let mut out = Vec::new();
            let mut err = Vec::new();
            let (status, _, _) = futures::try_join!(
                child.wait(),
                stdout.read_to_end(&mut out),
                stderr.read_to_end(&mut err)
            )?;
            Result::<_, std::io::Error>::Ok((status, out, err))
        };

        let (status, out, err) = match self.timeout {
            Some(limit) => timeout(limit, collect)
                .await
                .map_err(|_| EngineError::Timeout { limit })??,
            None => collect.await?,
        };
        guard.disarm();

        if !status.success() {
            return Err(EngineError::Exit {
                status,
                stderr: String::from_utf8_lossy(&err).trim().to_string(),
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl Engine for SubprocessEngine {
    async fn query(&self, request: &QueryRequest) -> Result<Box<dyn QueryReport>, EngineError> {
        let stdout = self.run(request).await?;
        Ok(Box::new(RawReport::new(stdout)))
    }

    fn command_line(&self, request: &QueryRequest) -> String {
        self.command.command_line(request)
    }
}
