//! Marketplace blockchain payment core daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   PaymentRequest (marketplace boundary)
//!        │
//!        ▼
//!   ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//!   │   payments   │───▶│   security   │    │    wallet    │
//!   │  processor   │    │ fraud gating │    │   balances   │
//!   └──────┬───────┘    └──────────────┘    └──────┬───────┘
//!          │                                        │
//!          ▼                                        ▼
//!   ┌──────────────┐                        ┌──────────────┐
//!   │ transaction  │───────────────────────▶│  rpc client  │──▶ chain
//!   │ confirmation │                        │ pooled HTTPS │
//!   └──────────────┘                        └──────────────┘
//!
//!   Cross-cutting: config (+hot reload), observability, lifecycle
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;

use chain_payments::config::loader::load_config;
use chain_payments::config::validation::validate_config;
use chain_payments::config::watcher::ConfigWatcher;
use chain_payments::config::AppConfig;
use chain_payments::lifecycle::Shutdown;
use chain_payments::observability::{logging, metrics};
use chain_payments::payments::{EscrowSweeper, HttpSigner, PaymentProcessor};
use chain_payments::rpc::RpcClient;
use chain_payments::security::SecurityService;
use chain_payments::transaction::TransactionService;
use chain_payments::wallet::WalletService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path: Option<PathBuf> = std::env::args().nth(1).map(PathBuf::from);
    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => {
            let config = AppConfig::default();
            validate_config(&config).expect("default config must validate");
            config
        }
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("chain-payments v0.1.0 starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let rpc = RpcClient::new(&config.rpc, config.retry.clone())?;

    // Probe the endpoint; an unreachable chain degrades rather than
    // aborting startup.
    if rpc.is_healthy().await {
        match rpc.get_version().await {
            Ok(version) => tracing::info!(
                node_version = %version.solana_core,
                network = %config.rpc.network,
                "RPC endpoint healthy"
            ),
            Err(e) => tracing::warn!(error = %e, "Endpoint healthy but version query failed"),
        }
    } else {
        tracing::warn!(
            endpoint = %config.rpc.endpoint,
            "RPC endpoint unhealthy at startup, continuing degraded"
        );
    }

    let signer = Arc::new(HttpSigner::new(&config.signer)?);
    let config_handle = Arc::new(ArcSwap::from_pointee(config.clone()));
    let shutdown = Shutdown::new();

    let wallet = WalletService::new(rpc.clone());
    let tx = TransactionService::new(rpc.clone(), config.transaction.clone());
    let security = Arc::new(SecurityService::new(
        wallet.clone(),
        rpc.clone(),
        Arc::clone(&config_handle),
    ));
    let processor = Arc::new(PaymentProcessor::new(
        rpc,
        wallet,
        tx,
        security,
        signer,
        Arc::clone(&config_handle),
        shutdown.sender(),
    ));

    let sweeper = EscrowSweeper::new(
        Arc::clone(&processor),
        config.escrow.sweep_interval_secs,
        shutdown.subscribe(),
    );
    tokio::spawn(sweeper.run());

    // Hot reload: validated config updates swap in atomically; thresholds
    // and escrow policy take effect on the next read.
    let _watcher = match &config_path {
        Some(path) => {
            let (watcher, mut updates) = ConfigWatcher::new(path);
            let handle = Arc::clone(&config_handle);
            let mut stop = shutdown.subscribe();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        update = updates.recv() => match update {
                            Some(new_config) => {
                                handle.store(Arc::new(new_config));
                                tracing::info!("Configuration reloaded");
                            }
                            None => return,
                        },
                        _ = stop.recv() => return,
                    }
                }
            });
            Some(watcher.run()?)
        }
        None => None,
    };

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    shutdown.trigger();

    tracing::info!("Shutdown complete");
    Ok(())
}
