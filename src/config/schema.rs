//! Configuration schema definitions.
//!
//! This module defines the complete configuration surface of the payment
//! core. All types derive Serde traits for deserialization from TOML.

use serde::{Deserialize, Serialize};

/// Root configuration for the payment core.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// JSON-RPC endpoint settings.
    pub rpc: RpcConfig,

    /// Retry policy for idempotent read calls.
    pub retry: RetryConfig,

    /// Transaction confirmation settings.
    pub transaction: TransactionConfig,

    /// External transaction-signing service.
    pub signer: SignerConfig,

    /// Escrow lifecycle settings.
    pub escrow: EscrowConfig,

    /// Fraud and risk thresholds.
    pub security: SecurityConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// JSON-RPC endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Endpoint URL (HTTPS in production).
    pub endpoint: String,

    /// Network identifier for logging and sanity checks
    /// (e.g. "mainnet-beta", "devnet").
    pub network: String,

    /// Default commitment level for queries ("processed", "confirmed",
    /// "finalized").
    pub commitment: String,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Total per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum idle pooled connections per host.
    pub max_idle_per_host: usize,

    /// Cap on concurrent in-flight RPC requests across all components.
    pub max_concurrent_requests: usize,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8899".to_string(),
            network: "devnet".to_string(),
            commitment: "confirmed".to_string(),
            connect_timeout_secs: 5,
            request_timeout_secs: 10,
            max_idle_per_host: 16,
            max_concurrent_requests: 64,
        }
    }
}

/// Retry configuration for idempotent read calls.
///
/// Submission calls (`sendTransaction`) are never retried automatically:
/// resubmitting after a perceived timeout can double-spend if the original
/// lands anyway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 5_000,
        }
    }
}

/// Transaction confirmation tracking configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransactionConfig {
    /// Status poll interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Default overall deadline for `wait_for_confirmation` in seconds.
    pub confirm_timeout_secs: u64,

    /// Short deadline used by `verify` in seconds.
    pub verify_timeout_secs: u64,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            confirm_timeout_secs: 30,
            verify_timeout_secs: 5,
        }
    }
}

/// External signing service configuration.
///
/// The core never holds private keys; transfers are signed by an external
/// wallet boundary reached over HTTP.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Signing service URL.
    pub endpoint: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:7700".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Policy applied to escrows that pass `expires_at` while still active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryPolicy {
    /// Return funds to the buyer (default).
    #[default]
    Refund,
    /// Pay out to the seller.
    Release,
    /// Mark expired and hold funds for manual review.
    Hold,
}

/// Escrow lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EscrowConfig {
    /// Default hold duration when the request does not specify one, seconds.
    pub default_duration_secs: u64,

    /// Background sweep interval in seconds.
    pub sweep_interval_secs: u64,

    /// What happens to funds when an active escrow expires.
    pub expiry_policy: ExpiryPolicy,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: 24 * 3600,
            sweep_interval_secs: 30,
            expiry_policy: ExpiryPolicy::Refund,
        }
    }
}

/// Fraud and risk configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Fraud probability at or above which an attempt is rejected.
    pub fraud_threshold: f64,

    /// Maximum payment attempts per user within the velocity window.
    pub velocity_limit: u32,

    /// Velocity window in seconds.
    pub velocity_window_secs: u64,

    /// Amount (lamports) above which a single payment counts as anomalous.
    pub large_amount_lamports: u64,

    /// Denylisted wallet addresses.
    pub denylist: Vec<String>,

    /// Audit log retention: maximum in-memory security events.
    pub max_events: usize,

    /// Require manual review instead of processing when wallet risk is
    /// critical.
    pub block_on_critical: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            fraud_threshold: 0.7,
            velocity_limit: 5,
            velocity_window_secs: 60,
            large_amount_lamports: 100_000_000_000,
            denylist: Vec::new(),
            max_events: 10_000,
            block_on_critical: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
