//! Background escrow expiry sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};

use crate::payments::processor::PaymentProcessor;
use crate::payments::signer::TransferSigner;

/// Periodically reconciles deadline-stranded escrow fundings and expires
/// overdue escrows.
///
/// The sweep interval is read once at startup; policy changes (refund vs
/// release vs hold) apply immediately through the processor's live config
/// handle.
pub struct EscrowSweeper<S: TransferSigner> {
    processor: Arc<PaymentProcessor<S>>,
    interval_secs: u64,
    shutdown: broadcast::Receiver<()>,
}

impl<S: TransferSigner> EscrowSweeper<S> {
    pub fn new(
        processor: Arc<PaymentProcessor<S>>,
        interval_secs: u64,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            processor,
            interval_secs,
            shutdown,
        }
    }

    /// Run until the shutdown signal fires.
    pub async fn run(mut self) {
        tracing::info!(interval_secs = self.interval_secs, "Escrow sweeper started");
        let mut ticker = interval(Duration::from_secs(self.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let recovered = self.processor.reconcile_pending().await;
                    if recovered > 0 {
                        tracing::info!(recovered, "Materialized escrows from landed funding transfers");
                    }
                    let swept = self.processor.expire_due().await;
                    if swept > 0 {
                        tracing::info!(swept, "Expired overdue escrows");
                    }
                }
                _ = self.shutdown.recv() => {
                    tracing::info!("Escrow sweeper stopping");
                    return;
                }
            }
        }
    }
}
