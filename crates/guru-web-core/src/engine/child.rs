use tokio::process::{Child, Command};

use crate::error::EngineError;

/// A running engine process that is killed if the guard is dropped while
/// still armed, e.g. when a query deadline cancels the collecting future.
pub struct ChildGuard {
    child: Child,
    armed: bool,
}

impl ChildGuard {
    pub fn spawn(cmd: &mut Command, program: &str) -> Result<Self, EngineError> {
        let child = cmd.spawn().map_err(|source| EngineError::Spawn {
            program: program.to_string(),
            source,
        })?;
        Ok(Self { child, armed: true })
    }

    pub fn child_mut(&mut self) -> &mut Child {
        &mut self.child
    }

    /// Call once the process has been reaped.
    pub fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if self.armed {
            // Non-blocking; tokio reaps the killed process in the background.
            let _ = self.child.start_kill();
        }
    }
}
