//! greeter binary.
//!
//! ```text
//! greeter [--config greeter.toml] [--bind 127.0.0.1:8080] [--verbose-payloads]
//! ```
//!
//! Payload logging is on when `--verbose-payloads` (or the config flag) is
//! given, or when the log filter enables `greeter::payload=debug`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use greeter::{Config, GreetingService, PayloadLogging, Server};

#[derive(Parser)]
#[command(name = "greeter", version, about = "Greeting demo service")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides `server.bind_address`.
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Overrides `logging.verbose_payloads`.
    #[arg(long)]
    verbose_payloads: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(addr) = cli.bind {
        config.server.bind_address = addr;
    }
    config.logging.verbose_payloads |= cli.verbose_payloads;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.logging.filter)?,
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let payload = if config.logging.verbose_payloads {
        PayloadLogging::new(true)
    } else {
        PayloadLogging::from_subscriber()
    };

    tracing::info!(
        bind_address = %config.server.bind_address,
        verbose_payloads = payload.is_verbose(),
        "configuration loaded"
    );

    let app = greeter::app(Arc::new(GreetingService::new()), payload);
    Server::bind(config.server.bind_address).serve(app).await?;

    Ok(())
}
