//! Transaction submission and confirmation tracking.
//!
//! # State machine (per signature)
//! ```text
//! pending → confirmed → finalized
//! pending/confirmed → failed
//! ```
//!
//! # Design Decisions
//! - Submission is one-shot: a resubmit after a perceived timeout can
//!   duplicate the on-chain effect if the original lands anyway
//! - Observed status never regresses; a stale poll cannot move a signature
//!   back from confirmed to pending
//! - A confirmation wait that hits its deadline returns the last known
//!   status, not an error; callers decide what "timeout" means for them

pub mod service;
pub mod types;

pub use service::TransactionService;
pub use types::{CommitmentLevel, TransactionStatus, TxStatus};
