//! Transaction lifecycle types.

use serde::{Deserialize, Serialize};

/// Lifecycle stage of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Pending,
    Confirmed,
    Finalized,
    Failed,
}

impl TxStatus {
    /// No further transitions happen from these states.
    pub fn is_terminal(self) -> bool {
        matches!(self, TxStatus::Finalized | TxStatus::Failed)
    }

    /// Monotonic merge of a fresh observation into the previous one.
    ///
    /// Ordering pending < confirmed < finalized is enforced; a finalized
    /// signature stays finalized even if a lagging node reports less.
    pub fn merge(prev: TxStatus, observed: TxStatus) -> TxStatus {
        match (prev, observed) {
            (TxStatus::Finalized, _) => TxStatus::Finalized,
            (TxStatus::Failed, _) => TxStatus::Failed,
            (_, TxStatus::Failed) => TxStatus::Failed,
            (prev, observed) => {
                if rank(observed) > rank(prev) {
                    observed
                } else {
                    prev
                }
            }
        }
    }
}

fn rank(status: TxStatus) -> u8 {
    match status {
        TxStatus::Pending => 0,
        TxStatus::Confirmed => 1,
        TxStatus::Finalized => 2,
        TxStatus::Failed => 3,
    }
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TxStatus::Pending => "pending",
            TxStatus::Confirmed => "confirmed",
            TxStatus::Finalized => "finalized",
            TxStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Confirmation depth a caller waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitmentLevel {
    Confirmed,
    Finalized,
}

impl CommitmentLevel {
    /// Whether the given status meets or exceeds this level.
    pub fn satisfied_by(self, status: TxStatus) -> bool {
        match self {
            CommitmentLevel::Confirmed => {
                matches!(status, TxStatus::Confirmed | TxStatus::Finalized)
            }
            CommitmentLevel::Finalized => matches!(status, TxStatus::Finalized),
        }
    }
}

/// Lifecycle snapshot of one submitted transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionStatus {
    /// Unique transaction signature.
    pub signature: String,
    pub status: TxStatus,
    /// Confirmation depth; `None` once rooted or while pending.
    pub confirmations: Option<u64>,
    /// Slot the transaction was processed in, when known.
    pub slot: Option<u64>,
    /// On-chain error detail for failed transactions.
    pub error: Option<String>,
}

impl TransactionStatus {
    pub fn pending(signature: &str) -> Self {
        Self {
            signature: signature.to_string(),
            status: TxStatus::Pending,
            confirmations: None,
            slot: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_never_regresses() {
        assert_eq!(
            TxStatus::merge(TxStatus::Confirmed, TxStatus::Pending),
            TxStatus::Confirmed
        );
        assert_eq!(
            TxStatus::merge(TxStatus::Finalized, TxStatus::Confirmed),
            TxStatus::Finalized
        );
        assert_eq!(
            TxStatus::merge(TxStatus::Pending, TxStatus::Confirmed),
            TxStatus::Confirmed
        );
    }

    #[test]
    fn failure_wins_over_non_terminal() {
        assert_eq!(
            TxStatus::merge(TxStatus::Pending, TxStatus::Failed),
            TxStatus::Failed
        );
        assert_eq!(
            TxStatus::merge(TxStatus::Confirmed, TxStatus::Failed),
            TxStatus::Failed
        );
        // A finalized transaction cannot retroactively fail.
        assert_eq!(
            TxStatus::merge(TxStatus::Finalized, TxStatus::Failed),
            TxStatus::Finalized
        );
    }

    #[test]
    fn commitment_levels() {
        assert!(CommitmentLevel::Confirmed.satisfied_by(TxStatus::Finalized));
        assert!(CommitmentLevel::Confirmed.satisfied_by(TxStatus::Confirmed));
        assert!(!CommitmentLevel::Confirmed.satisfied_by(TxStatus::Pending));
        assert!(!CommitmentLevel::Finalized.satisfied_by(TxStatus::Confirmed));
    }
}
