//! Risk assessment outputs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ordinal risk classification derived from a [0,1] score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Deterministic step function over the risk score.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s < 0.2 => RiskLevel::Safe,
            s if s < 0.4 => RiskLevel::Low,
            s if s < 0.6 => RiskLevel::Medium,
            s if s < 0.8 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of wallet risk assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletValidation {
    pub address: String,
    /// Syntactic base58 validity.
    pub valid: bool,
    /// Whether the chain knows the account.
    pub exists: bool,
    /// Risk score in [0,1].
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

impl WalletValidation {
    /// Conservative result when risk cannot be determined. Never "safe".
    pub fn unknown(address: &str, reason: &str) -> Self {
        Self {
            address: address.to_string(),
            valid: true,
            exists: false,
            risk_score: 0.5,
            risk_level: RiskLevel::Medium,
            warnings: vec![format!("risk could not be determined: {}", reason)],
            recommendations: vec!["retry validation before transferring funds".to_string()],
        }
    }
}

/// Outcome of on-chain transaction verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionVerification {
    pub signature: String,
    /// Whether the transaction is known to the chain.
    pub found: bool,
    /// Whether it executed without an on-chain error.
    pub succeeded: bool,
    /// Cross-check results; `None` when the caller supplied no expectation.
    pub amount_matches: Option<bool>,
    pub sender_matches: Option<bool>,
    pub recipient_matches: Option<bool>,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub warnings: Vec<String>,
}

impl TransactionVerification {
    /// Conservative result when verification could not run.
    pub fn unknown(signature: &str, reason: &str) -> Self {
        Self {
            signature: signature.to_string(),
            found: false,
            succeeded: false,
            amount_matches: None,
            sender_matches: None,
            recipient_matches: None,
            risk_score: 0.5,
            risk_level: RiskLevel::Medium,
            warnings: vec![format!("verification unavailable: {}", reason)],
        }
    }
}

/// Outcome of a fraud check on a payment attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudAssessment {
    pub user_id: String,
    /// Aggregated fraud probability in [0,1].
    pub probability: f64,
    /// True when the probability crossed the configured threshold.
    pub is_fraud: bool,
    pub risk_level: RiskLevel,
    /// Human-readable indicators that contributed to the probability.
    pub indicators: Vec<String>,
    /// Audit event written when the attempt was flagged.
    pub event_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_thresholds_are_a_step_function() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Safe);
        assert_eq!(RiskLevel::from_score(0.19), RiskLevel::Safe);
        assert_eq!(RiskLevel::from_score(0.2), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.45), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.6), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.8), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(1.0), RiskLevel::Critical);
    }

    #[test]
    fn levels_are_ordered() {
        assert!(RiskLevel::Safe < RiskLevel::Low);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn unknown_results_are_never_safe() {
        let wallet = WalletValidation::unknown("addr", "rpc down");
        assert!(wallet.risk_level >= RiskLevel::Medium);
        let tx = TransactionVerification::unknown("sig", "rpc down");
        assert!(tx.risk_level >= RiskLevel::Medium);
        assert!(!tx.succeeded);
    }
}
