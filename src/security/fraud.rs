//! Fraud indicators over a sliding attempt window.
//!
//! Each user carries a window of recent payment attempts; independent
//! indicators (velocity breach, duplicate submission, counterpart wallet
//! risk, anomalous amount) contribute weighted terms to one probability.

use std::collections::VecDeque;

use dashmap::DashMap;

use crate::config::schema::SecurityConfig;
use crate::security::types::RiskLevel;

#[derive(Debug, Clone)]
struct Attempt {
    at_secs: u64,
    amount: u64,
    recipient: String,
}

/// Per-user sliding windows of payment attempts.
#[derive(Default)]
pub struct FraudDetector {
    windows: DashMap<String, VecDeque<Attempt>>,
}

/// Weighted contribution of one indicator.
pub struct Indicator {
    pub weight: f64,
    pub description: String,
}

impl FraudDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an attempt and return the indicators it triggers.
    ///
    /// The window is pruned to `velocity_window_secs` on every call, so
    /// memory per user stays bounded by the attempt rate.
    pub fn observe(
        &self,
        user_id: &str,
        amount: u64,
        recipient: &str,
        wallet_risk: Option<RiskLevel>,
        config: &SecurityConfig,
        now_secs: u64,
    ) -> Vec<Indicator> {
        let mut indicators = Vec::new();

        let mut window = self.windows.entry(user_id.to_string()).or_default();
        let cutoff = now_secs.saturating_sub(config.velocity_window_secs);
        while window.front().is_some_and(|a| a.at_secs < cutoff) {
            window.pop_front();
        }

        let duplicate = window
            .iter()
            .any(|a| a.amount == amount && a.recipient == recipient);

        window.push_back(Attempt {
            at_secs: now_secs,
            amount,
            recipient: recipient.to_string(),
        });
        let count = window.len() as u32;
        drop(window);

        if count > config.velocity_limit {
            let excess = count - config.velocity_limit;
            indicators.push(Indicator {
                weight: (0.5 + 0.05 * excess as f64).min(0.75),
                description: format!(
                    "velocity limit exceeded: {} attempts in {}s (limit {})",
                    count, config.velocity_window_secs, config.velocity_limit
                ),
            });
        }

        if duplicate {
            indicators.push(Indicator {
                weight: 0.3,
                description: "duplicate submission: same amount and recipient within window"
                    .to_string(),
            });
        }

        match wallet_risk {
            Some(RiskLevel::Critical) => indicators.push(Indicator {
                weight: 0.35,
                description: "counterpart wallet risk is critical".to_string(),
            }),
            Some(RiskLevel::High) => indicators.push(Indicator {
                weight: 0.25,
                description: "counterpart wallet risk is high".to_string(),
            }),
            _ => {}
        }

        if amount >= config.large_amount_lamports {
            indicators.push(Indicator {
                weight: 0.2,
                description: format!("anomalously large amount: {} lamports", amount),
            });
        }

        indicators
    }
}

/// Fold indicator weights into a probability in [0,1].
pub fn fold_probability(indicators: &[Indicator]) -> f64 {
    indicators.iter().map(|i| i.weight).sum::<f64>().min(1.0)
}
