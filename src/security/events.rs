//! Append-only security audit log.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::observability::metrics;
use crate::security::types::RiskLevel;

/// An immutable audit record of a risk decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub id: Uuid,
    /// Seconds since epoch.
    pub created_at: u64,
    /// Wallet or user the decision concerns.
    pub subject: String,
    pub risk_level: RiskLevel,
    pub description: String,
    pub resolved: bool,
}

/// Bounded in-memory audit log.
///
/// Records are never mutated after creation; retention evicts the oldest
/// entries once `capacity` is reached (external archival happens at the
/// sink). Every record is also emitted as a structured log event so the
/// external audit channel sees it at least once.
pub struct SecurityEventLog {
    events: Mutex<VecDeque<SecurityEvent>>,
    capacity: usize,
}

impl SecurityEventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    /// Append a new event and emit it to the audit sink.
    pub fn record(&self, subject: &str, risk_level: RiskLevel, description: &str) -> Uuid {
        let event = SecurityEvent {
            id: Uuid::new_v4(),
            created_at: now_secs(),
            subject: subject.to_string(),
            risk_level,
            description: description.to_string(),
            resolved: false,
        };
        let id = event.id;

        tracing::warn!(
            event_id = %id,
            subject = %event.subject,
            risk_level = %risk_level,
            description = %event.description,
            "security event"
        );
        metrics::record_security_event(risk_level.as_str());

        let mut events = self.events.lock().expect("event log mutex poisoned");
        if events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);

        id
    }

    /// Most recent events, newest last.
    pub fn recent(&self, limit: usize) -> Vec<SecurityEvent> {
        let events = self.events.lock().expect("event log mutex poisoned");
        events
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .rev()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().expect("event log mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
