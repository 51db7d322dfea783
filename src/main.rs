use anyhow::Result;
use clap::Parser;

use guru_web_core::cli::Cli;
use guru_web_core::service;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    service::serve(cli.serve).await
}
