//! Runtime configuration.
//!
//! Hot-path structures (pools, queues, maps) size themselves from `const`s
//! declared next to their own definitions — those never belong here.
//! `RuntimeConfig` covers only cold-path, per-process settings: socket
//! endpoints, timeouts, and venue credentials, resolved from environment
//! variables and overridden by CLI flags (spec.md §6).

pub mod types;

pub use types::{HyperliquidConfig, RuntimeConfig};

use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;

const ENV_HYPERLIQUID_USER_ADDRESS: &str = "LATENTSPEED_HYPERLIQUID_USER_ADDRESS";
const ENV_HYPERLIQUID_PRIVATE_KEY: &str = "LATENTSPEED_HYPERLIQUID_PRIVATE_KEY";
const ENV_HYPERLIQUID_USE_TESTNET: &str = "LATENTSPEED_HYPERLIQUID_USE_TESTNET";
const ENV_HYPERLIQUID_SIGNER_PATH: &str = "LATENTSPEED_HYPERLIQUID_SIGNER_PATH";

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl RuntimeConfig {
    /// Build a config for `venue` from environment variables, applying
    /// `testnet`/`cpu_core`/`realtime` as CLI overrides on top (CLI always
    /// wins, per spec.md §6: "CLI selects venue and testnet/live mode").
    pub fn from_env(venue: &str, testnet_override: Option<bool>) -> Result<Self> {
        let hyperliquid = if venue.eq_ignore_ascii_case("hyperliquid") {
            Some(HyperliquidConfig::from_env()?)
        } else {
            None
        };

        let mut config = Self {
            ingress_endpoint: env::var("LATENTSPEED_INGRESS_ENDPOINT")
                .unwrap_or_else(|_| "tcp://127.0.0.1:5601".to_string()),
            egress_endpoint: env::var("LATENTSPEED_EGRESS_ENDPOINT")
                .unwrap_or_else(|_| "tcp://127.0.0.1:5602".to_string()),
            venue: venue.to_lowercase(),
            testnet: hyperliquid.as_ref().map(|h| h.use_testnet).unwrap_or(false),
            rest_timeout_secs: env_u64("LATENTSPEED_REST_TIMEOUT_SECS", 5),
            ws_idle_timeout_secs: env_u64("LATENTSPEED_WS_IDLE_TIMEOUT_SECS", 30),
            publisher_drain_timeout_ms: env_u64("LATENTSPEED_PUBLISHER_DRAIN_TIMEOUT_MS", 500),
            stats_interval_secs: env_u64("LATENTSPEED_STATS_INTERVAL_SECS", 10),
            log_level: env::var("LATENTSPEED_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            cpu_core: None,
            realtime: false,
            metrics_addr: env::var("LATENTSPEED_METRICS_ADDR").ok(),
            hyperliquid,
        };

        if let Some(testnet) = testnet_override {
            config.testnet = testnet;
            if let Some(h) = config.hyperliquid.as_mut() {
                h.use_testnet = testnet;
            }
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.venue.is_empty() {
            bail!("venue must not be empty");
        }
        if self.venue == "hyperliquid" && self.hyperliquid.is_none() {
            bail!("hyperliquid venue selected but LATENTSPEED_HYPERLIQUID_* env vars are unset");
        }
        Ok(())
    }
}

impl HyperliquidConfig {
    fn from_env() -> Result<Self> {
        let user_address = env::var(ENV_HYPERLIQUID_USER_ADDRESS)
            .with_context(|| format!("{ENV_HYPERLIQUID_USER_ADDRESS} not set"))?;
        let private_key_env_set = env::var(ENV_HYPERLIQUID_PRIVATE_KEY).is_ok();
        let use_testnet = env::var(ENV_HYPERLIQUID_USE_TESTNET)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let signer_path = env::var(ENV_HYPERLIQUID_SIGNER_PATH)
            .map(PathBuf::from)
            .with_context(|| format!("{ENV_HYPERLIQUID_SIGNER_PATH} not set"))?;

        Ok(Self {
            user_address,
            private_key_env_set,
            use_testnet,
            signer_path,
            rest_url: if use_testnet {
                "https://api.hyperliquid-testnet.xyz".to_string()
            } else {
                "https://api.hyperliquid.xyz".to_string()
            },
            ws_url: if use_testnet {
                "wss://api.hyperliquid-testnet.xyz/ws".to_string()
            } else {
                "wss://api.hyperliquid.xyz/ws".to_string()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn missing_hyperliquid_env_fails_validation() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::remove_var(ENV_HYPERLIQUID_USER_ADDRESS);
        let config = RuntimeConfig::from_env("hyperliquid", None).unwrap_err();
        assert!(config.to_string().contains("not set"));
    }

    #[test]
    fn testnet_cli_override_wins() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var(ENV_HYPERLIQUID_USER_ADDRESS, "0xabc");
        env::set_var(ENV_HYPERLIQUID_PRIVATE_KEY, "deadbeef");
        env::set_var(ENV_HYPERLIQUID_USE_TESTNET, "false");
        env::set_var(ENV_HYPERLIQUID_SIGNER_PATH, "/usr/local/bin/signer");

        let config = RuntimeConfig::from_env("hyperliquid", Some(true)).unwrap();
        assert!(config.testnet);
        assert!(config.hyperliquid.unwrap().use_testnet);

        env::remove_var(ENV_HYPERLIQUID_USER_ADDRESS);
        env::remove_var(ENV_HYPERLIQUID_PRIVATE_KEY);
        env::remove_var(ENV_HYPERLIQUID_USE_TESTNET);
        env::remove_var(ENV_HYPERLIQUID_SIGNER_PATH);
    }
}
