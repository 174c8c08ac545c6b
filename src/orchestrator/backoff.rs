//! Polling backoff schedule
//!
//! Maps a poll attempt number to the delay that precedes it. The tiers
//! favor responsiveness early, when answers are likely to arrive soon,
//! and reduce load later, when the question is probably stuck.

use std::time::Duration;

/// Tiered backoff schedule for the polling loop
///
/// Attempts 1-4 wait the base delay, 5-8 wait 1.75x, 9-12 wait 3x, and
/// 13 onward wait 5x. The schedule is non-decreasing by construction.
#[derive(Debug, Clone, Copy)]
pub struct BackoffSchedule {
    base_delay: Duration,
}

impl BackoffSchedule {
    /// Creates a schedule from the base inter-poll delay
    pub fn new(base_delay: Duration) -> Self {
        Self { base_delay }
    }

    /// Returns the delay to wait before the given attempt (1-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = match attempt {
            0..=4 => 1.0,
            5..=8 => 1.75,
            9..=12 => 3.0,
            _ => 5.0,
        };
        self.base_delay.mul_f64(multiplier)
    }

    /// Total wall-clock exposure of a full polling sequence
    ///
    /// The attempt budget combined with this bound is the loop's
    /// effective timeout; there is no separate deadline.
    pub fn total_delay(&self, max_attempts: u32) -> Duration {
        (1..=max_attempts)
            .map(|attempt| self.delay_for_attempt(attempt))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> BackoffSchedule {
        BackoffSchedule::new(Duration::from_secs(2))
    }

    #[test]
    fn test_first_tier_uses_base_delay() {
        let s = schedule();
        for attempt in 1..=4 {
            assert_eq!(s.delay_for_attempt(attempt), Duration::from_secs(2));
        }
    }

    #[test]
    fn test_second_tier_multiplier() {
        let s = schedule();
        for attempt in 5..=8 {
            assert_eq!(s.delay_for_attempt(attempt), Duration::from_millis(3500));
        }
    }

    #[test]
    fn test_third_tier_multiplier() {
        let s = schedule();
        for attempt in 9..=12 {
            assert_eq!(s.delay_for_attempt(attempt), Duration::from_secs(6));
        }
    }

    #[test]
    fn test_fourth_tier_multiplier() {
        let s = schedule();
        for attempt in [13, 14, 18, 100] {
            assert_eq!(s.delay_for_attempt(attempt), Duration::from_secs(10));
        }
    }

    #[test]
    fn test_delays_never_shrink() {
        let s = schedule();
        let mut previous = Duration::ZERO;
        for attempt in 1..=30 {
            let delay = s.delay_for_attempt(attempt);
            assert!(delay >= previous, "delay shrank at attempt {}", attempt);
            previous = delay;
        }
    }

    #[test]
    fn test_total_delay_for_reference_budget() {
        // 4*2s + 4*3.5s + 4*6s + 6*10s = 106s of scheduled waiting.
        let s = schedule();
        assert_eq!(s.total_delay(18), Duration::from_secs(106));
    }

    #[test]
    fn test_millisecond_base_scales() {
        let s = BackoffSchedule::new(Duration::from_millis(40));
        assert_eq!(s.delay_for_attempt(1), Duration::from_millis(40));
        assert_eq!(s.delay_for_attempt(5), Duration::from_millis(70));
        assert_eq!(s.delay_for_attempt(13), Duration::from_millis(200));
    }
}
