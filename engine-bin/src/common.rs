//! Shared CLI parsing and process setup for this crate's binaries.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// CLI arguments for the execution core binary (spec.md §6 "CLI selects
/// venue and testnet/live mode").
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CommonArgs {
    /// Venue adapter to route orders to.
    #[arg(short, long, default_value = "hyperliquid")]
    pub venue: String,

    /// Force testnet endpoints regardless of LATENTSPEED_HYPERLIQUID_USE_TESTNET.
    #[arg(long)]
    pub testnet: bool,

    /// Force live (mainnet) endpoints regardless of the env var.
    #[arg(long, conflicts_with = "testnet")]
    pub live: bool,

    /// CPU core to pin the Receiver thread to (Publisher gets core + 1).
    #[arg(short = 'c', long)]
    pub cpu_core: Option<usize>,

    /// Request real-time scheduling priority (requires privileges).
    #[arg(long)]
    pub realtime: bool,

    /// Log level, overridden by RUST_LOG if set.
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

impl CommonArgs {
    /// `Some(true)`/`Some(false)` when a CLI flag forces a mode, `None` to
    /// defer to the environment-derived default.
    pub fn testnet_override(&self) -> Option<bool> {
        if self.testnet {
            Some(true)
        } else if self.live {
            Some(false)
        } else {
            None
        }
    }
}

/// Initializes structured logging. `RUST_LOG` takes precedence over
/// `level` when set.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    Ok(())
}
