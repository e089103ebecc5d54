//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before a config is accepted into the system (startup and reload)

use crate::config::schema::AppConfig;
use crate::wallet;

/// A single semantic configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn err(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if url::Url::parse(&config.rpc.endpoint).is_err() {
        errors.push(err("rpc.endpoint", "not a valid URL"));
    }
    if url::Url::parse(&config.signer.endpoint).is_err() {
        errors.push(err("signer.endpoint", "not a valid URL"));
    }
    if !matches!(
        config.rpc.commitment.as_str(),
        "processed" | "confirmed" | "finalized"
    ) {
        errors.push(err(
            "rpc.commitment",
            "must be one of processed, confirmed, finalized",
        ));
    }
    if config.rpc.request_timeout_secs == 0 {
        errors.push(err("rpc.request_timeout_secs", "must be greater than 0"));
    }
    if config.rpc.connect_timeout_secs == 0 {
        errors.push(err("rpc.connect_timeout_secs", "must be greater than 0"));
    }
    if config.rpc.max_concurrent_requests == 0 {
        errors.push(err("rpc.max_concurrent_requests", "must be greater than 0"));
    }

    if config.retry.max_attempts == 0 {
        errors.push(err("retry.max_attempts", "must be at least 1"));
    }
    if config.retry.base_delay_ms > config.retry.max_delay_ms {
        errors.push(err("retry.base_delay_ms", "exceeds retry.max_delay_ms"));
    }

    if config.transaction.poll_interval_ms == 0 {
        errors.push(err("transaction.poll_interval_ms", "must be greater than 0"));
    }

    if config.escrow.default_duration_secs == 0 {
        errors.push(err("escrow.default_duration_secs", "must be greater than 0"));
    }
    if config.escrow.sweep_interval_secs == 0 {
        errors.push(err("escrow.sweep_interval_secs", "must be greater than 0"));
    }

    if !(config.security.fraud_threshold > 0.0 && config.security.fraud_threshold <= 1.0) {
        errors.push(err("security.fraud_threshold", "must be in (0, 1]"));
    }
    if config.security.velocity_limit == 0 {
        errors.push(err("security.velocity_limit", "must be at least 1"));
    }
    if config.security.max_events == 0 {
        errors.push(err("security.max_events", "must be greater than 0"));
    }
    for address in &config.security.denylist {
        if !wallet::validate_address(address) {
            errors.push(err(
                "security.denylist",
                format!("'{}' is not a valid address", address),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn collects_multiple_errors() {
        let mut config = AppConfig::default();
        config.rpc.endpoint = "not a url".to_string();
        config.rpc.commitment = "instant".to_string();
        config.security.fraud_threshold = 1.5;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.field == "rpc.endpoint"));
        assert!(errors.iter().any(|e| e.field == "security.fraud_threshold"));
    }

    #[test]
    fn rejects_bad_denylist_entry() {
        let mut config = AppConfig::default();
        config.security.denylist.push("l0O-not-base58".to_string());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "security.denylist");
    }
}
