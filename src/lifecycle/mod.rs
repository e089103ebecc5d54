//! Process lifecycle management.
//!
//! # Design Decisions
//! - Ordered startup: config first, then the RPC client, then background tasks
//! - Shutdown is a broadcast signal observed by every long-running loop
//! - Cancelling a confirmation wait never cancels a submitted transaction;
//!   the on-chain effect (if any) is re-resolved by a follow-up status poll

pub mod shutdown;

pub use shutdown::Shutdown;
