//! Camera relay server
//!
//! Run with: camrelay [--host HOST] [--port PORT] [--sweep-interval SECS] [--signaling]
//!
//! ## Cameras
//!
//! Connect a WebSocket to `ws://HOST:PORT/<camera-id>/stream` and send each
//! JPEG frame as one message. A `command` channel is available at
//! `ws://HOST:PORT/<camera-id>/command`.
//!
//! ## Viewers
//!
//! Open `http://HOST:PORT/camera/<camera-id>` in a browser.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::Parser;

use camrelay::{HubServer, LoggingHandler, ServerConfig};

#[derive(Debug, Parser)]
#[command(name = "camrelay", version, about = "Relay camera WebSocket frames to multipart HTTP viewers")]
struct Args {
    /// Address to bind to
    #[arg(long, env = "CAMRELAY_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = camrelay::server::DEFAULT_PORT)]
    port: u16,

    /// Seconds between liveness sweeps
    #[arg(
        long,
        env = "CAMRELAY_SWEEP_INTERVAL",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    sweep_interval: u64,

    /// Send START/STOP to cameras as viewers attach and detach
    #[arg(long, env = "CAMRELAY_SIGNALING")]
    signaling: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("camrelay=info")),
        )
        .init();

    let config = ServerConfig::with_addr(SocketAddr::new(args.host, args.port))
        .sweep_interval(Duration::from_secs(args.sweep_interval))
        .signaling(args.signaling);

    tracing::info!(
        addr = %config.bind_addr,
        sweep_interval_secs = args.sweep_interval,
        signaling = args.signaling,
        "Starting camera relay"
    );

    let server = HubServer::new(config, LoggingHandler);
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}
