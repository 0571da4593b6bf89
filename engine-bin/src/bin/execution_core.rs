//! The execution core process: binds the ingress/egress ZMQ sockets,
//! connects the selected venue adapter, and runs until a shutdown signal
//! arrives (spec.md §4.H, §6).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use latentspeed_core::adapter::hyperliquid::HyperliquidAdapter;
use latentspeed_core::adapter::Adapter;
use latentspeed_core::config::RuntimeConfig;
use latentspeed_core::engine::ExecutionEngine;
use latentspeed_engine::common::{init_logging, CommonArgs};

fn build_adapter(config: &RuntimeConfig) -> Result<Arc<dyn Adapter>> {
    match config.venue.as_str() {
        "hyperliquid" => {
            let hl_config = config
                .hyperliquid
                .clone()
                .context("hyperliquid venue selected but its config was not resolved")?;
            let timeout = Duration::from_secs(config.rest_timeout_secs);
            let idle_timeout = Duration::from_secs(config.ws_idle_timeout_secs);
            let adapter = HyperliquidAdapter::new(hl_config, timeout, idle_timeout)
                .context("failed to construct hyperliquid adapter")?;
            Ok(Arc::new(adapter))
        }
        other => anyhow::bail!("no adapter registered for venue '{other}'"),
    }
}

fn main() -> Result<()> {
    let args = CommonArgs::parse();
    init_logging(&args.log_level)?;

    let config = RuntimeConfig::from_env(&args.venue, args.testnet_override())
        .context("failed to resolve runtime configuration")?;
    config.validate().context("runtime configuration invalid")?;

    tracing::info!(
        venue = %config.venue,
        testnet = config.testnet,
        ingress = %config.ingress_endpoint,
        egress = %config.egress_endpoint,
        "starting execution core"
    );

    let adapter = build_adapter(&config)?;
    if let Some(hl) = config.hyperliquid.as_ref() {
        if !adapter.initialize(&hl.user_address, "", config.testnet) {
            anyhow::bail!("adapter initialize() failed, aborting startup");
        }
    }

    let metrics_addr = config.metrics_addr.clone();
    let engine = ExecutionEngine::new(config, adapter).context("failed to construct execution engine")?;
    engine.start().context("failed to start execution engine")?;

    let metrics_thread = metrics_addr.map(|addr_str| {
        let metrics = engine.metrics();
        std::thread::spawn(move || {
            let Ok(addr) = addr_str.parse() else {
                tracing::error!(addr = %addr_str, "invalid LATENTSPEED_METRICS_ADDR, metrics server disabled");
                return;
            };
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(err) => {
                    tracing::error!(error = %err, "failed to start metrics server runtime");
                    return;
                }
            };
            if let Err(err) = runtime.block_on(latentspeed_core::monitoring::serve_metrics(addr, metrics)) {
                tracing::error!(error = %err, "metrics server exited with error");
            }
        })
    });

    let shutdown_requested = Arc::new(AtomicBool::new(false));
    let ctrlc_flag = shutdown_requested.clone();
    ctrlc::set_handler(move || {
        ctrlc_flag.store(true, Ordering::SeqCst);
    })
    .context("failed to install ctrl-c handler")?;

    while !shutdown_requested.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(200));
    }

    tracing::info!("shutdown signal received, draining and stopping");
    engine.shutdown();
    drop(metrics_thread);

    Ok(())
}
