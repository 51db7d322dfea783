use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Top-level CLI definition for guru-web.
#[derive(Parser, Debug)]
#[command(name = "guru-web")]
#[command(about = "Web front-end for the Go source code guru", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub serve: ServeArgs,
}

/// Arguments controlling the scope and the HTTP service.
#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    /// HTTP listen address.
    #[arg(long = "http", default_value = "127.0.0.1:8080")]
    pub http_addr: SocketAddr,

    /// Log every incoming query as the guru command line that reproduces it.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Comma separated build tags used when loading packages and querying (e.g. 'foo,!darwin').
    #[arg(long)]
    pub tags: Option<String>,

    /// Path or name of the guru executable.
    #[arg(long, default_value = "guru")]
    pub guru: PathBuf,

    /// Go tool used to resolve the package arguments into source files.
    #[arg(long, default_value = "go")]
    pub go: String,

    /// Run at most one guru query at a time.
    #[arg(long, default_value_t = false)]
    pub serialize_queries: bool,

    /// Kill guru queries running longer than this many seconds; unlimited when unset.
    #[arg(long)]
    pub query_timeout_secs: Option<u64>,

    /// Packages or files forming the analysis scope.
    #[arg(required = true)]
    pub args: Vec<String>,
}
