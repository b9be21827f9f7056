//! iMio connector gateway.
//!
//! Hosts iA.Delib and Keycloak connector instances behind one HTTP server.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!                     │               CONNECTOR GATEWAY              │
//!   Caller (hub,      │  ┌────────┐   ┌──────────┐   ┌────────────┐  │
//!   forms, CLI)  ─────┼─▶│  http  │──▶│ security │──▶│ connectors │  │
//!                     │  │ server │   │ api keys │   │ ia_delib / │  │
//!                     │  └────────┘   └──────────┘   │ keycloak   │  │
//!                     │      ▲                       └─────┬──────┘  │
//!                     │      │ envelope                    ▼         │
//!                     │  ┌────────┐                  ┌────────────┐  │    iA.Delib
//!   ◀─────────────────┼──│response│◀─────────────────│  upstream  │◀─┼──▶ Keycloak
//!                     │  └────────┘                  │   client   │  │    form server
//!                     │                              └────────────┘  │
//!                     │  config · observability · lifecycle          │
//!                     └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use passerelle_imio::config::load_config;
use passerelle_imio::lifecycle::Shutdown;
use passerelle_imio::observability::{logging, metrics};
use passerelle_imio::HttpServer;

#[derive(Parser)]
#[command(name = "passerelle-imio")]
#[command(about = "iA.Delib and Keycloak connectors over HTTP", long_about = None)]
struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long, default_value = "passerelle.toml")]
    config: PathBuf,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", cli.config.display(), e);
            std::process::exit(2);
        }
    };
    if cli.check {
        println!(
            "{}: OK ({} iA.Delib, {} Keycloak)",
            cli.config.display(),
            config.ia_delib.len(),
            config.keycloak.len()
        );
        return Ok(());
    }

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "passerelle-imio starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
