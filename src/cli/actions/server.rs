use crate::{
    api,
    cli::{config::GatewayConfig, telemetry},
};
use anyhow::Result;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub config: GatewayConfig,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the user store cannot be opened or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Config: {:?}", args.config);

    let result = api::new(&args.config).await;

    telemetry::shutdown_tracer();

    result
}
