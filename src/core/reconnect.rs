//! Fixed-delay reconnect policy
//!
//! Decides, for each close of a live socket, whether the feed retries after
//! the configured delay or gives up.

use std::time::Duration;

use crate::config::StreamConfig;

/// What to do after the live transport of a feed closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Schedule another attempt after `delay`
    Retry { attempt: u32, delay: Duration },
    /// Budget exhausted; the feed stops
    GiveUp { attempts: u32 },
}

/// Fixed-delay reconnect policy
///
/// Pure decision logic; the channel owns the attempt counter and the timer.
/// Every close of a live transport consumes one attempt. The feed gives up
/// once `max_attempts` consecutive closes happened without a successful open
/// in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Fixed wait before each retry
    pub delay: Duration,
    /// Consecutive failed attempts tolerated before the feed is marked failed
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(5000),
            max_attempts: 5,
        }
    }
}

impl ReconnectPolicy {
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts,
        }
    }

    pub fn from_config(config: &StreamConfig) -> Self {
        Self::new(config.reconnect_delay(), config.max_reconnect_attempts)
    }

    /// True while `attempts` leaves room for another try
    pub fn should_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Consume one attempt for a close and decide what happens next
    ///
    /// `attempts` is the counter before this close; the returned decision
    /// carries the counter after it, which never exceeds `max_attempts`.
    pub fn on_close(&self, attempts: u32) -> RetryDecision {
        let next = attempts.saturating_add(1).min(self.max_attempts);
        if self.should_retry(next) {
            RetryDecision::Retry {
                attempt: next,
                delay: self.delay,
            }
        } else {
            RetryDecision::GiveUp { attempts: next }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_attempts: u32) -> ReconnectPolicy {
        ReconnectPolicy::new(Duration::from_millis(10), max_attempts)
    }

    #[test]
    fn test_reconnect_policy_default() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay(), Duration::from_millis(5000));
        assert_eq!(policy.max_attempts, 5);
    }

    #[test]
    fn test_first_close_schedules_retry() {
        assert_eq!(
            policy(5).on_close(0),
            RetryDecision::Retry {
                attempt: 1,
                delay: Duration::from_millis(10)
            }
        );
    }

    #[test]
    fn test_fifth_close_gives_up() {
        let policy = policy(5);
        let mut attempts = 0;
        let mut retries = 0;
        loop {
            match policy.on_close(attempts) {
                RetryDecision::Retry { attempt, .. } => {
                    attempts = attempt;
                    retries += 1;
                }
                RetryDecision::GiveUp { attempts: final_attempts } => {
                    assert_eq!(final_attempts, 5);
                    break;
                }
            }
        }
        // Four retries are scheduled; the fifth close exhausts the budget
        assert_eq!(retries, 4);
    }

    #[test]
    fn test_zero_budget_gives_up_immediately() {
        assert_eq!(policy(0).on_close(0), RetryDecision::GiveUp { attempts: 0 });
    }

    #[test]
    fn test_should_retry_boundary() {
        let policy = policy(3);
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }

    #[test]
    fn test_from_config_uses_configured_values() {
        let config = StreamConfig {
            reconnect_delay_ms: 250,
            max_reconnect_attempts: 2,
            ..StreamConfig::default()
        };
        let policy = ReconnectPolicy::from_config(&config);
        assert_eq!(policy.delay(), Duration::from_millis(250));
        assert_eq!(policy.max_attempts, 2);
    }

    // =========================================================================
    // Property-based tests (proptest)
    // =========================================================================

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn attempts_never_exceed_max(max in 0u32..20, closes in 0usize..50) {
                let policy = policy(max);
                let mut attempts = 0u32;
                for _ in 0..closes {
                    match policy.on_close(attempts) {
                        RetryDecision::Retry { attempt, .. } => {
                            prop_assert!(attempt < max);
                            attempts = attempt;
                        }
                        RetryDecision::GiveUp { attempts: final_attempts } => {
                            prop_assert_eq!(final_attempts, max);
                            break;
                        }
                    }
                }
                prop_assert!(attempts <= max);
            }
        }
    }
}
