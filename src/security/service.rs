//! Wallet validation, transaction verification, and fraud gating.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::schema::AppConfig;
use crate::observability::metrics;
use crate::rpc::RpcClient;
use crate::security::events::{now_secs, SecurityEventLog};
use crate::security::fraud::{fold_probability, FraudDetector};
use crate::security::types::{
    FraudAssessment, RiskLevel, TransactionVerification, WalletValidation,
};
use crate::wallet::{validate_address, WalletService};

/// Risk-scoring layer consulted before any payment commits.
///
/// All entry points are infallible by design: an internal failure produces
/// a conservative "unknown risk" result instead of an error or a false
/// "safe".
pub struct SecurityService {
    wallet: WalletService,
    rpc: RpcClient,
    events: Arc<SecurityEventLog>,
    fraud: FraudDetector,
    /// Live configuration handle; thresholds and the denylist follow
    /// config hot reloads.
    config: Arc<ArcSwap<AppConfig>>,
}

impl SecurityService {
    pub fn new(wallet: WalletService, rpc: RpcClient, config: Arc<ArcSwap<AppConfig>>) -> Self {
        let capacity = config.load().security.max_events;
        Self {
            wallet,
            rpc,
            events: Arc::new(SecurityEventLog::new(capacity)),
            fraud: FraudDetector::new(),
            config,
        }
    }

    /// The audit log, shared with read-only consumers.
    pub fn events(&self) -> Arc<SecurityEventLog> {
        Arc::clone(&self.events)
    }

    /// Combine syntax, on-chain existence, denylist membership, and account
    /// heuristics into one wallet risk score.
    pub async fn validate_wallet(&self, address: &str) -> WalletValidation {
        let mut warnings = Vec::new();
        let mut recommendations = Vec::new();
        let mut score: f64 = 0.0;

        if !validate_address(address) {
            return WalletValidation {
                address: address.to_string(),
                valid: false,
                exists: false,
                risk_score: 1.0,
                risk_level: RiskLevel::Critical,
                warnings: vec!["address is not syntactically valid".to_string()],
                recommendations: vec!["reject the address".to_string()],
            };
        }

        let config = self.config.load();
        if config.security.denylist.iter().any(|d| d == address) {
            self.events
                .record(address, RiskLevel::Critical, "denylisted wallet presented");
            return WalletValidation {
                address: address.to_string(),
                valid: true,
                exists: true,
                risk_score: 1.0,
                risk_level: RiskLevel::Critical,
                warnings: vec!["wallet is denylisted".to_string()],
                recommendations: vec!["block the transaction".to_string()],
            };
        }
        drop(config);

        let info = match self.wallet.get_wallet_info(address).await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(address, error = %e, "Wallet lookup failed during validation");
                return WalletValidation::unknown(address, &e.to_string());
            }
        };

        if !info.exists {
            score += 0.3;
            warnings.push("address has no on-chain history".to_string());
            recommendations.push("verify the recipient before a first payment".to_string());
        } else if info.lamports == 0 {
            score += 0.1;
            warnings.push("account exists but holds no balance".to_string());
        }

        if info.executable {
            score += 0.4;
            warnings.push("address is an executable program account".to_string());
            recommendations.push("confirm a program address is the intended recipient".to_string());
        }

        let risk_score = score.min(1.0);
        let risk_level = RiskLevel::from_score(risk_score);
        if risk_level >= RiskLevel::High {
            self.events
                .record(address, risk_level, "wallet validation scored high risk");
        }

        WalletValidation {
            address: address.to_string(),
            valid: true,
            exists: info.exists,
            risk_score,
            risk_level,
            warnings,
            recommendations,
        }
    }

    /// Fetch a transaction and cross-check whatever expectations the caller
    /// supplied, folding all findings into one risk score.
    pub async fn verify_transaction(
        &self,
        signature: &str,
        expected_amount: Option<u64>,
        expected_sender: Option<&str>,
        expected_recipient: Option<&str>,
    ) -> TransactionVerification {
        let mut warnings = Vec::new();
        let mut score: f64 = 0.0;

        let detail = match self.rpc.get_transaction(signature).await {
            Ok(detail) => detail,
            Err(e) => {
                tracing::warn!(signature, error = %e, "Transaction lookup failed");
                return TransactionVerification::unknown(signature, &e.to_string());
            }
        };

        let Some(detail) = detail else {
            warnings.push("transaction not found on-chain".to_string());
            return TransactionVerification {
                signature: signature.to_string(),
                found: false,
                succeeded: false,
                amount_matches: None,
                sender_matches: None,
                recipient_matches: None,
                risk_score: 0.6,
                risk_level: RiskLevel::High,
                warnings,
            };
        };

        let keys = &detail.transaction.message.account_keys;
        let meta = detail.meta.as_ref();
        let succeeded = meta.map(|m| m.err.is_none()).unwrap_or(false);
        if !succeeded {
            score += 0.5;
            warnings.push("transaction failed on-chain".to_string());
        }

        let sender_matches = expected_sender.map(|expected| {
            let matches = keys.first().is_some_and(|k| k == expected);
            if !matches {
                score += 0.4;
                warnings.push("fee payer does not match expected sender".to_string());
            }
            matches
        });

        let recipient_matches = expected_recipient.map(|expected| {
            let matches = keys.iter().any(|k| k == expected);
            if !matches {
                score += 0.4;
                warnings.push("expected recipient absent from account keys".to_string());
            }
            matches
        });

        let amount_matches = match (expected_amount, expected_recipient, meta) {
            (Some(expected), Some(recipient), Some(meta)) => {
                let credited = keys
                    .iter()
                    .position(|k| k == recipient)
                    .and_then(|i| Some(meta.post_balances.get(i)?.saturating_sub(*meta.pre_balances.get(i)?)));
                let matches = credited == Some(expected);
                if !matches {
                    score += 0.4;
                    warnings.push("recipient balance change does not match expected amount".to_string());
                }
                Some(matches)
            }
            _ => None,
        };

        // Transfers that round-trip back to the fee payer are a known
        // wash-trading shape.
        if let (Some(sender), Some(recipient)) = (expected_sender, expected_recipient) {
            if sender == recipient {
                score += 0.3;
                warnings.push("sender and recipient are the same wallet".to_string());
            }
        }

        let risk_score = score.min(1.0);
        let risk_level = RiskLevel::from_score(risk_score);
        if risk_level >= RiskLevel::High {
            self.events
                .record(signature, risk_level, "transaction verification scored high risk");
        }

        TransactionVerification {
            signature: signature.to_string(),
            found: true,
            succeeded,
            amount_matches,
            sender_matches,
            recipient_matches,
            risk_score,
            risk_level,
            warnings,
        }
    }

    /// Aggregate independent fraud indicators for one payment attempt.
    ///
    /// Crossing the configured threshold marks the attempt as fraud and
    /// writes exactly one immutable audit event.
    pub async fn detect_fraud(
        &self,
        user_id: &str,
        amount: u64,
        recipient: &str,
        wallet: Option<&str>,
    ) -> FraudAssessment {
        let wallet_risk = match wallet {
            Some(address) => Some(self.validate_wallet(address).await.risk_level),
            None => None,
        };

        let config = self.config.load();
        let indicators = self.fraud.observe(
            user_id,
            amount,
            recipient,
            wallet_risk,
            &config.security,
            now_secs(),
        );
        let probability = fold_probability(&indicators);
        let is_fraud = probability >= config.security.fraud_threshold;
        drop(config);

        // A critical counterpart stays critical even when the folded
        // probability alone would not reach that level.
        let mut risk_level = RiskLevel::from_score(probability);
        if let Some(counterpart) = wallet_risk {
            risk_level = risk_level.max(counterpart);
        }
        let descriptions: Vec<String> = indicators.into_iter().map(|i| i.description).collect();

        let event_id = if is_fraud {
            metrics::record_fraud_detection();
            let description = format!(
                "fraud detected (p={:.2}): {}",
                probability,
                descriptions.join("; ")
            );
            Some(self.events.record(user_id, risk_level, &description))
        } else {
            None
        };

        FraudAssessment {
            user_id: user_id.to_string(),
            probability,
            is_fraud,
            risk_level,
            indicators: descriptions,
            event_id,
        }
    }

    /// Whether payments must be blocked outright at this risk level.
    pub fn blocks_at(&self, level: RiskLevel) -> bool {
        self.config.load().security.block_on_critical && level >= RiskLevel::Critical
    }
}
