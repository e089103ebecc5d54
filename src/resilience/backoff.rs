//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Delay to sleep before retry attempt `attempt` (1-based).
///
/// Doubles the base delay per attempt, capped at `max_ms`, with up to 10%
/// random jitter added on top.
pub fn retry_delay(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let factor = 2u64.saturating_pow(attempt - 1);
    let capped = base_ms.saturating_mul(factor).min(max_ms);

    let jitter_range = capped / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_exponentially() {
        assert_eq!(retry_delay(0, 200, 5000), Duration::ZERO);

        let d1 = retry_delay(1, 200, 5000);
        assert!(d1.as_millis() >= 200 && d1.as_millis() <= 220);

        let d3 = retry_delay(3, 200, 5000);
        assert!(d3.as_millis() >= 800);
    }

    #[test]
    fn respects_cap() {
        let d = retry_delay(20, 200, 1000);
        assert!(d.as_millis() >= 1000 && d.as_millis() <= 1100);
    }
}
