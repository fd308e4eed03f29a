//! Translation server binary.
//!
//! # Architecture Overview
//!
//! ```text
//!     beng-proxy                ┌──────────────────────────────────────────────┐
//!     ──────────────────────────┼─▶ net::listener ─▶ net::connection          │
//!       BEGIN ... END           │                      │ RequestAssembler      │
//!                               │                      ▼                       │
//!                               │               translation::Engine            │
//!                               │                 │            │               │
//!                               │          routing table   providers           │
//!                               │                 │   (widgets, stat, auth)    │
//!                               │                 ▼                            │
//!     ◀─────────────────────────┼── translation::encoder (BEGIN ... END)       │
//!                               │                                              │
//!                               │  config · observability · lifecycle          │
//!                               └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use translation_server::config::{load_config, validate_config, ConfigError, TranslationConfig};
use translation_server::lifecycle::{signals, Shutdown};
use translation_server::net::Listener;
use translation_server::observability::{init_logging, metrics};
use translation_server::{Engine, TranslationServer};

#[derive(Debug, Parser)]
#[command(name = "translation-server", version, about = "beng-proxy translation server")]
struct Cli {
    /// Unix socket path or host:port to listen on.
    listen: Option<String>,

    /// TOML configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory served below /cm4all-beng-proxy/.
    #[arg(long, value_name = "DIR")]
    js_dir: Option<String>,
}

impl Cli {
    fn load(&self) -> Result<TranslationConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => TranslationConfig::default(),
        };

        if let Some(listen) = &self.listen {
            config.listener.address = listen.clone();
        }
        if let Some(js_dir) = &self.js_dir {
            config.paths.js = js_dir.clone();
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.load()?;

    init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.listener.address,
        max_connections = config.listener.max_connections,
        "translation-server starting"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = Listener::bind(&config.listener).await?;
    let engine = Arc::new(Engine::new(config));
    let server = TranslationServer::new(engine, listener);

    let shutdown = Shutdown::new();
    let serving = server.run(&shutdown);
    tokio::pin!(serving);

    tokio::select! {
        result = &mut serving => result?,
        _ = signals::shutdown_on_signal(&shutdown) => (&mut serving).await?,
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
