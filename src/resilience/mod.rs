//! Resilience utilities for outbound RPC traffic.
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every RPC call has a deadline
//! - Retries only for idempotent read methods, never for submissions
//! - Jittered backoff prevents thundering herd against a recovering node

pub mod backoff;

pub use backoff::retry_delay;
