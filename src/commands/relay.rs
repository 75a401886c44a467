//! `relay` command: run the central broadcast relay.

use anyhow::Result;
use clap::Args;

use super::CommandExecutor;
use crate::relay::{RelayConfig, RelayServer, DEFAULT_BIND_ADDR, DEFAULT_QUEUE_CAPACITY};

/// Run the central relay.
///
/// The relay never sees plaintext: it tags each inbound payload with the
/// sender's identity and rebroadcasts it to every connected peer.
#[derive(Args, Debug)]
pub struct RelayCommand {
    /// Address to listen on
    #[arg(short, long, default_value = DEFAULT_BIND_ADDR)]
    pub bind: String,

    /// Capacity of the broadcast queue (producers block while it is full)
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,
}

impl CommandExecutor for RelayCommand {
    fn execute(&self) -> Result<()> {
        init_logging();

        let config = RelayConfig {
            bind_addr: self.bind.clone(),
            queue_capacity: self.queue_capacity,
            ..RelayConfig::default()
        };

        let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
        rt.block_on(async {
            let server = RelayServer::bind(config).await?;
            tracing::info!(version = env!("CARGO_PKG_VERSION"), "blindrelay starting");
            server.run().await?;
            Ok(())
        })
    }
}

/// Initializes tracing, honoring a RUST_LOG override.
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
