//! Payment orchestration: direct transfers and the escrow state machine.
//!
//! # Data Flow
//! ```text
//! PaymentRequest
//!     → security (fraud gate)
//!     → wallet (balance check)
//!     → signer boundary (external key management)
//!     → transaction (submit + confirmation wait)
//!     → escrow store (state transition, if escrow mode)
//! ```
//!
//! # Design Decisions
//! - The processor is the only writer of escrow status
//! - Transitions for one escrow id are serialized by a per-id async lock;
//!   release and refund issued concurrently cannot both succeed
//! - A failed stage leaves escrow state unchanged; an ambiguous
//!   confirmation timeout leaves it active for the caller to re-poll
//! - An escrow funding unconfirmed at its deadline is queued and
//!   reconciled by the sweeper once the signature settles, so a late
//!   landing still yields a releasable escrow

pub mod escrow;
pub mod processor;
pub mod signer;
pub mod sweeper;
pub mod types;

pub use escrow::EscrowStore;
pub use processor::PaymentProcessor;
pub use signer::{HttpSigner, SignerError, TransferRequest, TransferSigner};
pub use sweeper::EscrowSweeper;
pub use types::{
    EscrowInfo, EscrowStatus, PaymentError, PaymentRequest, PaymentResult, PaymentStage,
};
