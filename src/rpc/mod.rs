//! JSON-RPC 2.0 client subsystem.
//!
//! # Data Flow
//! ```text
//! Config (endpoint, commitment, timeouts, pool caps)
//!     → client.rs (pooled HTTP transport, request ids, retry for reads)
//!     → types.rs (typed request/response envelopes and values)
//!     → error.rs (one normalized error shape for all failure modes)
//! ```
//!
//! # Design Decisions
//! - Transport, HTTP-status, and protocol `error` fields all normalize to
//!   `RpcError` so callers never branch on transport vs. protocol failure
//! - Strictly increasing request ids for correlation, not idempotency
//! - Read calls may be retried with jittered backoff; `sendTransaction`
//!   never is

pub mod client;
pub mod error;
pub mod types;

pub use client::RpcClient;
pub use error::{RpcError, RpcResult};
