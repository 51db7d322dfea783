use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};

use crate::cli::ServeArgs;
use crate::engine::{BlockingGuru, Engine, GuruCommand, LockedEngine, SubprocessEngine};
use crate::gate::QueryGate;
use crate::scope::{GoListLoader, LoadedScope, PackageInfo};

use super::http;

/// How queries reach the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineStrategy {
    /// One engine process per query, run concurrently.
    Subprocess,
    /// Every query runs inside one process-wide critical section.
    Serialized,
}

/// Configuration applied when launching the service.
#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub http_addr: SocketAddr,
    pub verbose: bool,
    pub tags: Option<String>,
    pub guru: PathBuf,
    pub go: String,
    pub strategy: EngineStrategy,
    pub query_timeout: Option<Duration>,
    pub args: Vec<String>,
}

impl ServeConfig {
    /// Build a runtime configuration from the CLI arguments.
    pub fn try_from_args(args: ServeArgs) -> Result<Self> {
        if args.args.is_empty() {
            bail!("no package arguments");
        }
        let guru = resolve_program(&args.guru)?;

        let strategy = if args.serialize_queries {
            EngineStrategy::Serialized
        } else {
            EngineStrategy::Subprocess
        };
        let mut query_timeout = args.query_timeout_secs.map(Duration::from_secs);
        if query_timeout.is_some() && strategy == EngineStrategy::Serialized {
            tracing::warn!("query timeout has no effect with --serialize-queries; ignoring");
            query_timeout = None;
        }

        Ok(Self {
            http_addr: args.http_addr,
            verbose: args.verbose,
            tags: args.tags.filter(|t| !t.trim().is_empty()),
            guru,
            go: args.go,
            strategy,
            query_timeout,
            args: args.args,
        })
    }

    /// The `-scope` value handed to guru.
    pub fn engine_scope(&self) -> String {
        self.args.join(",")
    }

    pub fn build_engine(&self) -> Arc<dyn Engine> {
        let command = GuruCommand::new(self.guru.to_string_lossy(), self.engine_scope())
            .with_tags(self.tags.clone());
        match self.strategy {
            EngineStrategy::Subprocess => {
                Arc::new(SubprocessEngine::new(command).with_timeout(self.query_timeout))
            }
            EngineStrategy::Serialized => {
                Arc::new(LockedEngine::new(BlockingGuru::new(command.clone()), command))
            }
        }
    }
}

/// Per-process state shared by every request handler.
pub struct AppContext {
    pub gate: QueryGate,
    pub packages: Vec<PackageInfo>,
    /// Scope arguments as shown to the user.
    pub scope_label: String,
}

impl AppContext {
    pub fn new(gate: QueryGate, packages: Vec<PackageInfo>, scope_label: impl Into<String>) -> Self {
        Self {
            gate,
            packages,
            scope_label: scope_label.into(),
        }
    }
}

/// Loads the scope once, then serves HTTP until a shutdown signal.
pub struct GuruWebServer {
    config: ServeConfig,
}

impl GuruWebServer {
    pub fn new(config: ServeConfig) -> Self {
        Self { config }
    }

    pub async fn run(self) -> Result<()> {
        let loader = GoListLoader::new(self.config.go.clone(), self.config.tags.clone());
        let LoadedScope { files, packages } = loader.load(&self.config.args).await?;
        tracing::info!(
            files = files.len(),
            packages = packages.len(),
            strategy = ?self.config.strategy,
            "scope loaded"
        );

        let gate = QueryGate::new(Arc::new(files), self.config.build_engine())
            .with_verbose(self.config.verbose);
        let context = AppContext::new(gate, packages, self.config.args.join(" "));

        http::serve(self.config.http_addr, Arc::new(context)).await
    }
}

/// Locate `program` the way a shell would: paths are checked directly, bare
/// names are searched on `PATH`.
fn resolve_program(program: &Path) -> Result<PathBuf> {
    if program.components().count() > 1 {
        if program.is_file() {
            return Ok(program.to_path_buf());
        }
        bail!("can't find {}", program.display());
    }
    let found = env::var_os("PATH").and_then(|paths| {
        env::split_paths(&paths)
            .map(|dir| dir.join(program))
            .find(|candidate| candidate.is_file())
    });
    match found {
        Some(path) => Ok(path),
        None => bail!("can't find {} in your path", program.display()),
    }
}
