//! Payment processing pipeline and escrow transitions.

use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::config::schema::{AppConfig, ExpiryPolicy};
use crate::observability::metrics;
use crate::payments::escrow::{derive_escrow_address, EscrowStore};
use crate::payments::signer::{TransferRequest, TransferSigner};
use crate::payments::types::{
    EscrowInfo, EscrowStatus, PaymentError, PaymentRequest, PaymentResult, PaymentStage,
};
use crate::rpc::RpcClient;
use crate::security::events::now_secs;
use crate::security::SecurityService;
use crate::transaction::{CommitmentLevel, TransactionService, TxStatus};
use crate::wallet::{validate_address, WalletService};

/// Which side of an escrow a settlement pays out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Release,
    Refund,
}

/// Orchestrates direct and escrow payments.
///
/// Sole owner of escrow state; every transition goes through the per-id
/// lock in the store so exactly one terminal transition can win.
pub struct PaymentProcessor<S: TransferSigner> {
    rpc: RpcClient,
    wallet: WalletService,
    tx: TransactionService,
    security: Arc<SecurityService>,
    escrows: Arc<EscrowStore>,
    /// Escrow funding transfers unconfirmed at their deadline, keyed by
    /// signature, awaiting reconciliation.
    pending_escrows: DashMap<String, PendingEscrow>,
    signer: Arc<S>,
    config: Arc<ArcSwap<AppConfig>>,
    /// Shutdown handle; confirmation waits subscribe per call so a
    /// stopping daemon is not pinned for a full deadline.
    cancel: broadcast::Sender<()>,
}

/// An escrow whose funding transfer may still land. Held until a later
/// poll settles the signature one way or the other.
struct PendingEscrow {
    address: String,
    buyer: String,
    seller: String,
    amount: u64,
    duration_secs: u64,
}

impl<S: TransferSigner> PaymentProcessor<S> {
    pub fn new(
        rpc: RpcClient,
        wallet: WalletService,
        tx: TransactionService,
        security: Arc<SecurityService>,
        signer: Arc<S>,
        config: Arc<ArcSwap<AppConfig>>,
        cancel: broadcast::Sender<()>,
    ) -> Self {
        Self {
            rpc,
            wallet,
            tx,
            security,
            escrows: Arc::new(EscrowStore::new()),
            pending_escrows: DashMap::new(),
            signer,
            config,
            cancel,
        }
    }

    /// The escrow store, shared read-only with collaborators.
    pub fn escrows(&self) -> Arc<EscrowStore> {
        Arc::clone(&self.escrows)
    }

    /// Single entry point for direct and escrow payments.
    pub async fn process_payment(&self, request: &PaymentRequest) -> PaymentResult {
        let mode = if request.escrow { "escrow" } else { "direct" };
        let result = self.process_inner(request).await;
        metrics::record_payment(mode, result.success);
        if let Some(stage) = result.failed_stage {
            metrics::record_payment_failure(stage.as_str());
            tracing::warn!(
                mode,
                stage = stage.as_str(),
                error = result.error.as_deref().unwrap_or(""),
                "Payment failed"
            );
        }
        result
    }

    async fn process_inner(&self, request: &PaymentRequest) -> PaymentResult {
        // Stage 1: structural validation, no network.
        if let Err(e) = request.validate() {
            return PaymentResult::failed(PaymentStage::Validation, e);
        }
        for address in [&request.sender, &request.recipient] {
            if !validate_address(address) {
                return PaymentResult::failed(
                    PaymentStage::Validation,
                    PaymentError::InvalidAddress(address.clone()),
                );
            }
        }

        // Stage 2: risk gate before anything irreversible.
        let assessment = self
            .security
            .detect_fraud(
                &request.sender,
                request.amount,
                &request.recipient,
                Some(&request.recipient),
            )
            .await;
        if assessment.is_fraud || self.security.blocks_at(assessment.risk_level) {
            return PaymentResult::failed(
                PaymentStage::Risk,
                PaymentError::FraudSuspected {
                    probability: assessment.probability,
                },
            );
        }

        // Stage 3: confirm funds. The wallet service never guesses, so a
        // lookup failure fails the stage rather than assuming a balance.
        let sender_info = match self.wallet.get_wallet_info(&request.sender).await {
            Ok(info) => info,
            Err(e) => return PaymentResult::failed(PaymentStage::Balance, e),
        };
        if !sender_info.exists || sender_info.lamports < request.amount {
            return PaymentResult::failed(
                PaymentStage::Balance,
                PaymentError::InsufficientBalance {
                    required: request.amount,
                    available: sender_info.lamports,
                },
            );
        }

        // Stage 4: build, sign, submit.
        let escrow_address = request.escrow.then(derive_escrow_address);
        let destination = escrow_address.as_deref().unwrap_or(&request.recipient);

        let signature = match self
            .transfer(&request.sender, destination, request.amount, request.memo.clone())
            .await
        {
            Ok(sig) => sig,
            Err(e) => return PaymentResult::failed(PaymentStage::Submission, e),
        };

        // Stage 5: confirmation.
        match self.await_confirmation(&signature).await {
            ConfirmOutcome::Landed => {}
            ConfirmOutcome::Failed(detail) => {
                let mut result = PaymentResult::failed(PaymentStage::Confirmation, detail);
                result.signature = Some(signature);
                return result;
            }
            ConfirmOutcome::StillPending => {
                // Ambiguous: the transfer may still land. No escrow record
                // is created until the funds are known to be held, but the
                // creation intent is kept so a late landing still yields a
                // releasable escrow.
                if let Some(address) = &escrow_address {
                    self.note_pending_escrow(&signature, address, request);
                }
                return PaymentResult::pending(signature, escrow_address);
            }
        }

        if let Some(escrow_address) = escrow_address {
            let now = now_secs();
            let duration = request
                .escrow_duration_secs
                .unwrap_or(self.config.load().escrow.default_duration_secs);
            self.escrows.insert(EscrowInfo {
                address: escrow_address.clone(),
                buyer: request.sender.clone(),
                seller: request.recipient.clone(),
                amount: request.amount,
                created_at: now,
                expires_at: now + duration,
                status: EscrowStatus::Active,
                dispute_reason: None,
                settlement_signature: None,
            });
            metrics::record_active_escrows(self.escrows.active_count());
            tracing::info!(
                escrow = %escrow_address,
                buyer = %request.sender,
                seller = %request.recipient,
                amount = request.amount,
                "Escrow created"
            );
            return PaymentResult::ok(signature, Some(escrow_address));
        }

        PaymentResult::ok(signature, None)
    }

    /// Release escrowed funds to the seller. `active → released`.
    pub async fn release_escrow(&self, escrow_id: &str) -> PaymentResult {
        self.settle(escrow_id, Settlement::Release, EscrowStatus::Active)
            .await
    }

    /// Return escrowed funds to the buyer. `active → refunded`.
    pub async fn refund_escrow(&self, escrow_id: &str) -> PaymentResult {
        self.settle(escrow_id, Settlement::Refund, EscrowStatus::Active)
            .await
    }

    /// Flag an active escrow as disputed. Disputed escrows are exempt from
    /// expiry and resolve only through `resolve_dispute`.
    pub async fn dispute_escrow(&self, escrow_id: &str, reason: &str) -> Result<(), PaymentError> {
        let entry = self
            .escrows
            .entry(escrow_id)
            .ok_or_else(|| PaymentError::EscrowNotFound(escrow_id.to_string()))?;
        let mut escrow = entry.lock().await;

        if escrow.status != EscrowStatus::Active {
            return Err(PaymentError::EscrowNotActive {
                id: escrow_id.to_string(),
                status: escrow.status,
            });
        }

        escrow.status = EscrowStatus::Disputed;
        escrow.dispute_reason = Some(reason.to_string());
        metrics::record_escrow_transition("disputed");
        metrics::record_active_escrows(self.escrows.active_count());
        tracing::info!(escrow = escrow_id, reason, "Escrow disputed");
        Ok(())
    }

    /// Settle a disputed escrow by an authorized resolver's explicit
    /// decision.
    pub async fn resolve_dispute(&self, escrow_id: &str, outcome: Settlement) -> PaymentResult {
        self.settle(escrow_id, outcome, EscrowStatus::Disputed).await
    }

    /// One atomic terminal transition. Holds the per-id lock across the
    /// whole check-transfer-transition sequence so a concurrent release and
    /// refund cannot both pass the status check.
    async fn settle(
        &self,
        escrow_id: &str,
        outcome: Settlement,
        expected: EscrowStatus,
    ) -> PaymentResult {
        let Some(entry) = self.escrows.entry(escrow_id) else {
            return PaymentResult::failed(
                PaymentStage::Validation,
                PaymentError::EscrowNotFound(escrow_id.to_string()),
            );
        };
        let mut escrow = entry.lock().await;

        if escrow.status != expected {
            let err = match expected {
                EscrowStatus::Disputed => PaymentError::EscrowNotDisputed {
                    id: escrow_id.to_string(),
                    status: escrow.status,
                },
                _ => PaymentError::EscrowNotActive {
                    id: escrow_id.to_string(),
                    status: escrow.status,
                },
            };
            return PaymentResult::failed(PaymentStage::Validation, err);
        }

        // Releasing is irreversible; gate it through fraud detection.
        if outcome == Settlement::Release {
            let assessment = self
                .security
                .detect_fraud(&escrow.buyer, escrow.amount, &escrow.seller, Some(&escrow.seller))
                .await;
            if assessment.is_fraud || self.security.blocks_at(assessment.risk_level) {
                return PaymentResult::failed(
                    PaymentStage::Risk,
                    PaymentError::FraudSuspected {
                        probability: assessment.probability,
                    },
                );
            }
        }

        let (to, target_status, label) = match outcome {
            Settlement::Release => (escrow.seller.clone(), EscrowStatus::Released, "released"),
            Settlement::Refund => (escrow.buyer.clone(), EscrowStatus::Refunded, "refunded"),
        };

        let signature = match self
            .transfer(&escrow.address, &to, escrow.amount, None)
            .await
        {
            // Submission failed outright: no transition, escrow unchanged.
            Err(e) => return PaymentResult::failed(PaymentStage::Submission, e),
            Ok(sig) => sig,
        };

        match self.await_confirmation(&signature).await {
            ConfirmOutcome::Landed => {
                escrow.status = target_status;
                escrow.settlement_signature = Some(signature.clone());
                metrics::record_escrow_transition(label);
                metrics::record_active_escrows(self.escrows.active_count());
                tracing::info!(escrow = escrow_id, signature = %signature, status = label, "Escrow settled");
                PaymentResult::ok(signature, Some(escrow_id.to_string()))
            }
            ConfirmOutcome::Failed(detail) => {
                // The settlement transfer failed on-chain; funds stay held.
                let mut result = PaymentResult::failed(PaymentStage::Confirmation, detail);
                result.signature = Some(signature);
                result.escrow_address = Some(escrow_id.to_string());
                result
            }
            ConfirmOutcome::StillPending => {
                // The transfer may yet land; leave the escrow as-is and let
                // the caller re-poll before retrying.
                PaymentResult::pending(signature, Some(escrow_id.to_string()))
            }
        }
    }

    fn note_pending_escrow(&self, signature: &str, address: &str, request: &PaymentRequest) {
        let duration = request
            .escrow_duration_secs
            .unwrap_or(self.config.load().escrow.default_duration_secs);
        self.pending_escrows.insert(
            signature.to_string(),
            PendingEscrow {
                address: address.to_string(),
                buyer: request.sender.clone(),
                seller: request.recipient.clone(),
                amount: request.amount,
                duration_secs: duration,
            },
        );
        tracing::warn!(
            signature,
            escrow = address,
            "Escrow funding unconfirmed at deadline, queued for reconciliation"
        );
    }

    /// Re-poll escrow funding transfers that were unconfirmed at their
    /// deadline. A landed transfer materializes the escrow record with its
    /// hold window starting now; a failed one drops the intent. Returns
    /// how many escrows were materialized.
    pub async fn reconcile_pending(&self) -> usize {
        let signatures: Vec<String> = self
            .pending_escrows
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        let mut recovered = 0;

        for signature in signatures {
            let status = match self.tx.get_status(&signature).await {
                Ok(status) => status,
                Err(e) => {
                    tracing::warn!(signature = %signature, error = %e, "Pending escrow poll failed");
                    continue;
                }
            };

            match status.status {
                TxStatus::Confirmed | TxStatus::Finalized => {
                    let Some((_, pending)) = self.pending_escrows.remove(&signature) else {
                        continue;
                    };
                    let now = now_secs();
                    self.escrows.insert(EscrowInfo {
                        address: pending.address.clone(),
                        buyer: pending.buyer,
                        seller: pending.seller,
                        amount: pending.amount,
                        created_at: now,
                        expires_at: now + pending.duration_secs,
                        status: EscrowStatus::Active,
                        dispute_reason: None,
                        settlement_signature: None,
                    });
                    metrics::record_active_escrows(self.escrows.active_count());
                    recovered += 1;
                    tracing::info!(
                        signature = %signature,
                        escrow = %pending.address,
                        "Escrow funding landed, record materialized"
                    );
                }
                TxStatus::Failed => {
                    self.pending_escrows.remove(&signature);
                    tracing::warn!(
                        signature = %signature,
                        "Escrow funding failed on-chain, creation intent dropped"
                    );
                }
                TxStatus::Pending => {}
            }
        }

        recovered
    }

    /// Expire overdue escrows and apply the configured funds policy.
    ///
    /// Each overdue escrow is marked `expired` exactly once; the funds path
    /// runs after the mark, and a funds-path failure is surfaced for manual
    /// follow-up rather than reverting the mark.
    pub async fn expire_due(&self) -> usize {
        let now = now_secs();
        let due = self.escrows.due_for_expiry(now);
        let policy = self.config.load().escrow.expiry_policy;
        let mut swept = 0;

        for id in due {
            let Some(entry) = self.escrows.entry(&id) else {
                continue;
            };
            let mut escrow = entry.lock().await;
            // Re-check under the lock; a racing transition may have won.
            if escrow.status != EscrowStatus::Active || escrow.expires_at > now {
                continue;
            }

            escrow.status = EscrowStatus::Expired;
            metrics::record_escrow_swept();
            metrics::record_escrow_transition("expired");
            swept += 1;
            tracing::info!(escrow = %id, policy = ?policy, "Escrow expired");

            let funds_to = match policy {
                ExpiryPolicy::Refund => Some(escrow.buyer.clone()),
                ExpiryPolicy::Release => Some(escrow.seller.clone()),
                ExpiryPolicy::Hold => None,
            };

            match funds_to {
                None => {
                    self.security.events().record(
                        &id,
                        crate::security::RiskLevel::Medium,
                        "escrow expired; funds held for manual review",
                    );
                }
                Some(to) => match self.transfer(&escrow.address, &to, escrow.amount, None).await {
                    Ok(signature) => {
                        escrow.settlement_signature = Some(signature);
                    }
                    Err(e) => {
                        tracing::error!(escrow = %id, error = %e, "Expiry funds transfer failed");
                        self.security.events().record(
                            &id,
                            crate::security::RiskLevel::High,
                            "expiry funds transfer failed; manual follow-up required",
                        );
                    }
                },
            }
        }

        metrics::record_active_escrows(self.escrows.active_count());
        swept
    }

    /// Build, sign, and submit one transfer. Submission is one-shot.
    async fn transfer(
        &self,
        from: &str,
        to: &str,
        lamports: u64,
        memo: Option<String>,
    ) -> Result<String, PaymentError> {
        let blockhash = self.rpc.get_latest_blockhash().await?;
        let signed = self
            .signer
            .sign_transfer(TransferRequest {
                from: from.to_string(),
                to: to.to_string(),
                lamports,
                memo,
                recent_blockhash: blockhash.blockhash,
            })
            .await
            .map_err(|e| PaymentError::Signing(e.to_string()))?;
        Ok(self.tx.submit(&signed).await?)
    }

    /// Wait out the confirmation deadline, or the shutdown signal. A
    /// cancelled wait reports the last known (pending) status; the
    /// submitted transaction itself is never cancelled.
    async fn await_confirmation(&self, signature: &str) -> ConfirmOutcome {
        let timeout = self.tx.confirm_timeout();
        let mut cancel = self.cancel.subscribe();
        match self
            .tx
            .wait_with_cancel(signature, timeout, CommitmentLevel::Confirmed, &mut cancel)
            .await
        {
            Ok(status) => match status.status {
                TxStatus::Confirmed | TxStatus::Finalized => ConfirmOutcome::Landed,
                TxStatus::Failed => ConfirmOutcome::Failed(
                    status
                        .error
                        .unwrap_or_else(|| "transaction failed on-chain".to_string()),
                ),
                TxStatus::Pending => ConfirmOutcome::StillPending,
            },
            Err(e) => ConfirmOutcome::Failed(e.to_string()),
        }
    }
}

enum ConfirmOutcome {
    Landed,
    Failed(String),
    StillPending,
}
