//! Submission, polling, and confirmation waits.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::config::schema::TransactionConfig;
use crate::rpc::types::SignatureStatusValue;
use crate::rpc::{RpcClient, RpcResult};
use crate::transaction::types::{CommitmentLevel, TransactionStatus, TxStatus};

/// How long a terminal (finalized/failed) signature stays in the stage
/// cache. Far past any confirmation deadline, so monotonicity holds for
/// the whole polling window while the cache stays bounded.
const TERMINAL_RETENTION: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy)]
struct StageEntry {
    status: TxStatus,
    updated_at: Instant,
}

/// Submits transactions and tracks their confirmation lifecycle.
///
/// Holds the per-signature stage cache; other components read statuses
/// through this service and never mutate them.
#[derive(Debug, Clone)]
pub struct TransactionService {
    rpc: RpcClient,
    config: TransactionConfig,
    stages: Arc<DashMap<String, StageEntry>>,
}

impl TransactionService {
    pub fn new(rpc: RpcClient, config: TransactionConfig) -> Self {
        Self {
            rpc,
            config,
            stages: Arc::new(DashMap::new()),
        }
    }

    /// One-shot submission of a pre-signed transaction.
    pub async fn submit(&self, signed_tx_base64: &str) -> RpcResult<String> {
        let signature = self.rpc.send_transaction(signed_tx_base64).await?;
        self.prune_stages();
        self.stages.insert(
            signature.clone(),
            StageEntry {
                status: TxStatus::Pending,
                updated_at: Instant::now(),
            },
        );
        tracing::info!(signature = %signature, "Transaction submitted");
        Ok(signature)
    }

    /// Evict terminal entries past retention; a settled signature only
    /// needs to stay cached while someone may still poll it.
    fn prune_stages(&self) {
        self.stages.retain(|_, entry| {
            !entry.status.is_terminal() || entry.updated_at.elapsed() < TERMINAL_RETENTION
        });
    }

    /// Single status poll, merged monotonically with prior observations.
    pub async fn get_status(&self, signature: &str) -> RpcResult<TransactionStatus> {
        let statuses = self.rpc.get_signature_statuses(&[signature]).await?;
        let observed = statuses.into_iter().next().flatten();
        Ok(self.merge_observation(signature, observed))
    }

    fn merge_observation(
        &self,
        signature: &str,
        observed: Option<SignatureStatusValue>,
    ) -> TransactionStatus {
        let (status, confirmations, slot, error) = match &observed {
            None => (TxStatus::Pending, None, None, None),
            Some(value) => {
                let status = if value.err.is_some() {
                    TxStatus::Failed
                } else {
                    match value.confirmation_status.as_deref() {
                        Some("finalized") => TxStatus::Finalized,
                        Some("confirmed") => TxStatus::Confirmed,
                        _ => TxStatus::Pending,
                    }
                };
                let error = value.err.as_ref().map(|e| e.to_string());
                (status, value.confirmations, Some(value.slot), error)
            }
        };

        let mut entry = self.stages.entry(signature.to_string()).or_insert(StageEntry {
            status: TxStatus::Pending,
            updated_at: Instant::now(),
        });
        let merged = TxStatus::merge(entry.status, status);
        *entry = StageEntry {
            status: merged,
            updated_at: Instant::now(),
        };
        drop(entry);

        TransactionStatus {
            signature: signature.to_string(),
            status: merged,
            confirmations,
            slot,
            error,
        }
    }

    /// Poll until `target` is reached, a terminal failure is observed, or
    /// the deadline elapses.
    ///
    /// Hitting the deadline returns the last known (possibly still-pending)
    /// status: the transaction may still land, and that ambiguity is the
    /// caller's to resolve with a follow-up poll.
    pub async fn wait_for_confirmation(
        &self,
        signature: &str,
        timeout: Duration,
        target: CommitmentLevel,
    ) -> RpcResult<TransactionStatus> {
        self.wait_inner(signature, timeout, target, None).await
    }

    /// As `wait_for_confirmation`, but also stops when the shutdown signal
    /// fires. Cancelling the wait never cancels the submitted transaction.
    pub async fn wait_with_cancel(
        &self,
        signature: &str,
        timeout: Duration,
        target: CommitmentLevel,
        cancel: &mut broadcast::Receiver<()>,
    ) -> RpcResult<TransactionStatus> {
        self.wait_inner(signature, timeout, target, Some(cancel)).await
    }

    async fn wait_inner(
        &self,
        signature: &str,
        timeout: Duration,
        target: CommitmentLevel,
        mut cancel: Option<&mut broadcast::Receiver<()>>,
    ) -> RpcResult<TransactionStatus> {
        let deadline = Instant::now() + timeout;
        let mut ticker = interval(Duration::from_millis(self.config.poll_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last_known = TransactionStatus::pending(signature);

        loop {
            if let Some(rx) = cancel.as_deref_mut() {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = rx.recv() => {
                        tracing::debug!(signature, "Confirmation wait cancelled");
                        return Ok(last_known);
                    }
                }
            } else {
                ticker.tick().await;
            }

            match self.get_status(signature).await {
                Ok(status) => {
                    if status.status == TxStatus::Failed || target.satisfied_by(status.status) {
                        return Ok(status);
                    }
                    last_known = status;
                }
                // Transient poll failures do not abort the wait; the
                // deadline bounds how long we keep trying.
                Err(e) => {
                    tracing::warn!(signature, error = %e, "Status poll failed");
                }
            }

            if Instant::now() >= deadline {
                tracing::debug!(
                    signature,
                    status = %last_known.status,
                    "Confirmation wait deadline reached"
                );
                return Ok(last_known);
            }
        }
    }

    /// True only when the transaction reached at least `confirmed` within a
    /// short deadline.
    pub async fn verify(&self, signature: &str) -> bool {
        let timeout = Duration::from_secs(self.config.verify_timeout_secs);
        match self
            .wait_for_confirmation(signature, timeout, CommitmentLevel::Confirmed)
            .await
        {
            Ok(status) => CommitmentLevel::Confirmed.satisfied_by(status.status),
            Err(_) => false,
        }
    }

    /// Default confirmation deadline from configuration.
    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.config.confirm_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{RetryConfig, RpcConfig};
    use serde_json::json;

    fn service() -> TransactionService {
        let rpc = RpcClient::new(&RpcConfig::default(), RetryConfig::default()).unwrap();
        TransactionService::new(rpc, TransactionConfig::default())
    }

    fn observation(confirmation_status: &str, err: Option<serde_json::Value>) -> SignatureStatusValue {
        serde_json::from_value(json!({
            "slot": 12,
            "confirmations": 4,
            "err": err,
            "confirmationStatus": confirmation_status,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn stale_observation_does_not_regress() {
        let service = service();

        let first = service.merge_observation("sig1", Some(observation("finalized", None)));
        assert_eq!(first.status, TxStatus::Finalized);

        // A lagging node still reporting "confirmed".
        let second = service.merge_observation("sig1", Some(observation("confirmed", None)));
        assert_eq!(second.status, TxStatus::Finalized);

        // Unknown-to-node maps to pending, which also must not regress.
        let third = service.merge_observation("sig1", None);
        assert_eq!(third.status, TxStatus::Finalized);
    }

    fn entry_at(status: TxStatus, updated_at: Instant) -> StageEntry {
        StageEntry { status, updated_at }
    }

    #[tokio::test]
    async fn prune_evicts_only_stale_terminal_stages() {
        let service = service();
        let stale = Instant::now().checked_sub(TERMINAL_RETENTION * 2).unwrap();

        service
            .stages
            .insert("finalized-old".to_string(), entry_at(TxStatus::Finalized, stale));
        service
            .stages
            .insert("failed-old".to_string(), entry_at(TxStatus::Failed, stale));
        service
            .stages
            .insert("finalized-fresh".to_string(), entry_at(TxStatus::Finalized, Instant::now()));
        // Non-terminal entries stay regardless of age; a poll may still
        // move them forward.
        service
            .stages
            .insert("confirmed-old".to_string(), entry_at(TxStatus::Confirmed, stale));

        service.prune_stages();

        assert!(service.stages.get("finalized-old").is_none());
        assert!(service.stages.get("failed-old").is_none());
        assert!(service.stages.get("finalized-fresh").is_some());
        assert!(service.stages.get("confirmed-old").is_some());
    }

    #[tokio::test]
    async fn on_chain_error_maps_to_failed() {
        let service = service();
        let status = service.merge_observation(
            "sig2",
            Some(observation("confirmed", Some(json!({"InstructionError": [0, "Custom"]})))),
        );
        assert_eq!(status.status, TxStatus::Failed);
        assert!(status.error.unwrap().contains("InstructionError"));
    }
}
