//! Randomized pacing between automation steps.

use rand::Rng;
use std::time::Duration;

/// Uniformly distributed delay over `[min_ms, max_ms]`, in milliseconds.
///
/// Bounds given in the wrong order are swapped.
pub fn next_delay(min_ms: u64, max_ms: u64) -> u64 {
    let (lo, hi) = if min_ms <= max_ms {
        (min_ms, max_ms)
    } else {
        (max_ms, min_ms)
    };
    if lo == hi {
        return lo;
    }
    rand::thread_rng().gen_range(lo..=hi)
}

/// Pacing policy applied before launch, after navigation, after clicks,
/// and between scroll attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayPolicy {
    min_ms: u64,
    max_ms: u64,
}

impl DelayPolicy {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// A policy that never waits.
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    pub fn next_delay(&self) -> u64 {
        next_delay(self.min_ms, self.max_ms)
    }

    /// Sleep for one randomized interval.
    pub async fn pause(&self, step: &str) {
        let delay_ms = self.next_delay();
        if delay_ms == 0 {
            return;
        }
        tracing::debug!(step, delay_ms, "pacing");
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_stays_in_bounds() {
        for _ in 0..1000 {
            let d = next_delay(1000, 3000);
            assert!((1000..=3000).contains(&d));
        }
    }

    #[test]
    fn test_reversed_and_degenerate_bounds() {
        for _ in 0..100 {
            let d = next_delay(50, 10);
            assert!((10..=50).contains(&d));
        }
        assert_eq!(next_delay(7, 7), 7);
        assert_eq!(DelayPolicy::none().next_delay(), 0);
    }

    #[test]
    fn test_delay_is_not_constant() {
        let samples: std::collections::HashSet<u64> =
            (0..200).map(|_| next_delay(0, 1_000_000)).collect();
        assert!(samples.len() > 1);
    }

    #[tokio::test]
    async fn test_zero_policy_returns_immediately() {
        let start = std::time::Instant::now();
        DelayPolicy::none().pause("test").await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
