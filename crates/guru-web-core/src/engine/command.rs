use std::borrow::Cow;

use crate::format::OutputFormat;

use super::QueryRequest;

/// Builds `guru` invocations for a fixed scope.
///
/// Flags precede the mode and position, as the guru CLI expects, and `--`
/// ends flag parsing so neither is read as a flag:
/// `guru [-json] [-tags T] -scope S -- <mode> <pos>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuruCommand {
    program: String,
    scope: String,
    tags: Option<String>,
}

impl GuruCommand {
    pub fn new(program: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            scope: scope.into(),
            tags: None,
        }
    }

    pub fn with_tags(mut self, tags: Option<String>) -> Self {
        self.tags = tags.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the program, excluding the program itself.
    pub fn args(&self, request: &QueryRequest) -> Vec<String> {
        let mut args = Vec::with_capacity(8);
        if request.format == OutputFormat::Json {
            args.push("-json".to_string());
        }
        if let Some(tags) = &self.tags {
            args.push("-tags".to_string());
            args.push(tags.clone());
        }
        args.push("-scope".to_string());
        args.push(self.scope.clone());
        args.push("--".to_string());
        args.push(request.mode.clone());
        args.push(request.pos.clone());
        args
    }

    /// Shell-pasteable rendering of the full invocation.
    pub fn command_line(&self, request: &QueryRequest) -> String {
        std::iter::once(self.program.clone())
            .chain(self.args(request))
            .map(|arg| shell_quote(&arg).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn std_command(&self, request: &QueryRequest) -> std::process::Command {
        let mut cmd = std::process::Command::new(&self.program);
        cmd.args(self.args(request));
        cmd
    }

    pub fn tokio_command(&self, request: &QueryRequest) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(self.args(request));
        cmd
    }
}

fn shell_quote(arg: &str) -> Cow<'_, str> {
    let plain = !arg.is_empty()
        && arg
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"-_./:#,=+@%".contains(&b));
    if plain {
        Cow::Borrowed(arg)
    } else {
        Cow::Owned(format!("'{}'", arg.replace('\'', r"'\''")))
    }
}
