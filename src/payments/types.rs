//! Payment and escrow domain types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rpc::RpcError;

/// Pipeline stage a payment failed in, so the marketplace layer can show
/// an accurate status instead of a generic failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStage {
    Validation,
    Risk,
    Balance,
    Submission,
    Confirmation,
}

impl PaymentStage {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStage::Validation => "validation",
            PaymentStage::Risk => "risk",
            PaymentStage::Balance => "balance",
            PaymentStage::Submission => "submission",
            PaymentStage::Confirmation => "confirmation",
        }
    }
}

/// Errors raised while processing payments and escrow operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("sender and recipient are the same wallet")]
    SelfPayment,

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("insufficient balance: need {required} lamports, have {available}")]
    InsufficientBalance { required: u64, available: u64 },

    #[error("payment blocked by risk check (probability {probability:.2})")]
    FraudSuspected { probability: f64 },

    #[error("escrow {0} not found")]
    EscrowNotFound(String),

    #[error("escrow {id} is {status}, expected active")]
    EscrowNotActive { id: String, status: EscrowStatus },

    #[error("escrow {id} is {status}, expected disputed")]
    EscrowNotDisputed { id: String, status: EscrowStatus },

    #[error("signing failed: {0}")]
    Signing(String),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// An intent to move funds, supplied by the marketplace layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Marketplace order this payment settles, if any.
    pub order_id: Option<String>,
    pub sender: String,
    pub recipient: String,
    /// Amount in lamports.
    pub amount: u64,
    pub memo: Option<String>,
    /// Route funds through a program-controlled escrow account.
    pub escrow: bool,
    /// Escrow hold duration; falls back to the configured default.
    pub escrow_duration_secs: Option<u64>,
}

impl PaymentRequest {
    /// Structural checks that need no network access.
    pub fn validate(&self) -> Result<(), PaymentError> {
        if self.amount == 0 {
            return Err(PaymentError::ZeroAmount);
        }
        if self.sender == self.recipient {
            return Err(PaymentError::SelfPayment);
        }
        Ok(())
    }
}

/// Outcome of processing a payment request or escrow operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResult {
    pub success: bool,
    /// Transaction signature; present whenever a submission happened, even
    /// if the outcome is still ambiguous.
    pub signature: Option<String>,
    pub escrow_address: Option<String>,
    /// Stage that failed, when `success` is false.
    pub failed_stage: Option<PaymentStage>,
    pub error: Option<String>,
}

impl PaymentResult {
    pub fn ok(signature: String, escrow_address: Option<String>) -> Self {
        Self {
            success: true,
            signature: Some(signature),
            escrow_address,
            failed_stage: None,
            error: None,
        }
    }

    pub fn failed(stage: PaymentStage, error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            signature: None,
            escrow_address: None,
            failed_stage: Some(stage),
            error: Some(error.to_string()),
        }
    }

    /// Ambiguous outcome: submitted, but the confirmation deadline passed
    /// while the transaction was still in flight. Not a success and not a
    /// definite failure; the caller re-polls the signature.
    pub fn pending(signature: String, escrow_address: Option<String>) -> Self {
        Self {
            success: false,
            signature: Some(signature),
            escrow_address,
            failed_stage: Some(PaymentStage::Confirmation),
            error: Some(
                "confirmation still pending at deadline; re-poll the signature".to_string(),
            ),
        }
    }
}

/// Escrow lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    Active,
    Released,
    Refunded,
    Expired,
    Disputed,
}

impl EscrowStatus {
    /// Terminal states admit no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            EscrowStatus::Released | EscrowStatus::Refunded | EscrowStatus::Expired
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EscrowStatus::Active => "active",
            EscrowStatus::Released => "released",
            EscrowStatus::Refunded => "refunded",
            EscrowStatus::Expired => "expired",
            EscrowStatus::Disputed => "disputed",
        }
    }
}

impl std::fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A held-funds contract between buyer and seller.
///
/// Owned exclusively by the payment processor, which is the only writer of
/// `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowInfo {
    /// Program-controlled escrow account address (unique id).
    pub address: String,
    pub buyer: String,
    pub seller: String,
    /// Held amount in lamports.
    pub amount: u64,
    /// Seconds since epoch.
    pub created_at: u64,
    pub expires_at: u64,
    pub status: EscrowStatus,
    /// Reason recorded when the escrow was disputed.
    pub dispute_reason: Option<String>,
    /// Signature of the transaction that settled the escrow.
    pub settlement_signature: Option<String>,
}
