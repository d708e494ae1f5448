use std::io;

use scr_mcp::{SimulatorConfig, SimulatorServer};
use tracing_subscriber::EnvFilter;

fn main() -> io::Result<()> {
    let config = SimulatorConfig::from_env();

    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    let server = SimulatorServer::from_config(&config).map_err(|err| {
        tracing::error!(error = %err, "failed to start simulator");
        io::Error::new(io::ErrorKind::InvalidData, err.to_string())
    })?;
    server.serve_stdio()
}
