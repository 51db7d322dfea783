use anyhow::Result;

use crate::cli::ServeArgs;
use crate::telemetry;

pub mod assets;
pub mod http;
pub mod server;
pub mod view;

pub use server::{AppContext, GuruWebServer, ServeConfig};

/// Load the scope and serve the web front-end until shutdown.
pub async fn serve(args: ServeArgs) -> Result<()> {
    telemetry::init()?;
    let config = ServeConfig::try_from_args(args)?;
    GuruWebServer::new(config).run().await
}
