//! Risk scoring and fraud detection.
//!
//! # Data Flow
//! ```text
//! Payment Processor
//!     → service.rs (wallet validation, transaction verification)
//!     → fraud.rs (velocity / duplicate / counterpart indicators)
//!     → events.rs (append-only audit log, pushed to the external sink
//!       via structured logging, at-least-once)
//! ```
//!
//! # Design Decisions
//! - Never silently fail: an internal error downgrades to a conservative
//!   "unknown risk" result, never a false "safe"
//! - Risk level is a fixed step function of the score
//! - Events are immutable once created

pub mod events;
pub mod fraud;
pub mod service;
pub mod types;

pub use events::{SecurityEvent, SecurityEventLog};
pub use service::SecurityService;
pub use types::{FraudAssessment, RiskLevel, TransactionVerification, WalletValidation};
