//! `tollgate run`: start the gateway.
//!
//! Loads and validates the configuration, starts the server, and on
//! Ctrl+C / SIGTERM drains in-flight requests before exiting.

use std::net::SocketAddr;
use std::time::Duration;

use crate::cli::RunArgs;
use crate::config;
use crate::error::GatewayError;
use crate::logging;
use crate::server::{self, Server};

pub async fn execute(args: RunArgs) -> Result<(), GatewayError> {
    logging::init(&args.log_level, logging::resolve_format(args.pretty, args.json));

    let path = config::locate(args.config.as_deref()).await?;
    let mut config = config::load(&path).await?;

    if let Some(timeout) = args.timeout {
        config.defaults.timeout = timeout;
    }

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let running = Server::new(&config, args.max_body)?.start(addr).await?;

    tracing::info!(
        config = %path.display(),
        timeout_ms = config.defaults.timeout,
        "accepting requests"
    );

    server::shutdown_signal().await;
    running.stop(Duration::from_secs(args.shutdown_grace)).await;
    Ok(())
}
