use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_ingress_endpoint() -> String {
    "tcp://127.0.0.1:5601".to_string()
}

fn default_egress_endpoint() -> String {
    "tcp://127.0.0.1:5602".to_string()
}

fn default_rest_timeout_secs() -> u64 {
    5
}

fn default_ws_idle_timeout_secs() -> u64 {
    30
}

fn default_publisher_drain_timeout_ms() -> u64 {
    500
}

fn default_stats_interval_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Runtime (cold-path) configuration: socket endpoints, timeouts, and
/// per-venue credential paths. Hot-path constants (pool/queue/map
/// capacities) stay as `const` definitions alongside the structures they
/// size, per spec.md §5 — they are not part of this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_ingress_endpoint")]
    pub ingress_endpoint: String,

    #[serde(default = "default_egress_endpoint")]
    pub egress_endpoint: String,

    pub venue: String,

    #[serde(default)]
    pub testnet: bool,

    #[serde(default = "default_rest_timeout_secs")]
    pub rest_timeout_secs: u64,

    #[serde(default = "default_ws_idle_timeout_secs")]
    pub ws_idle_timeout_secs: u64,

    #[serde(default = "default_publisher_drain_timeout_ms")]
    pub publisher_drain_timeout_ms: u64,

    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub cpu_core: Option<usize>,

    #[serde(default)]
    pub realtime: bool,

    #[serde(default)]
    pub metrics_addr: Option<String>,

    pub hyperliquid: Option<HyperliquidConfig>,
}

/// Reference-adapter credentials and transport endpoints, resolved from
/// environment variables per spec.md §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HyperliquidConfig {
    pub user_address: String,
    pub private_key_env_set: bool,
    pub use_testnet: bool,
    pub signer_path: PathBuf,
    #[serde(default = "default_hyperliquid_rest_url")]
    pub rest_url: String,
    #[serde(default = "default_hyperliquid_ws_url")]
    pub ws_url: String,
}

fn default_hyperliquid_rest_url() -> String {
    "https://api.hyperliquid.xyz".to_string()
}

fn default_hyperliquid_ws_url() -> String {
    "wss://api.hyperliquid.xyz/ws".to_string()
}
