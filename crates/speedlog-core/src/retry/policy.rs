use std::time::Duration;

use crate::config::RetryConfig;
use crate::invoker::FailureKind;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the given delay.
    RetryAfter(Duration),
    /// Stop retrying; the tick records an ERROR row.
    GiveUp,
}

/// Fixed-schedule backoff: the delay after attempt `i` fails is `delays[i]`.
///
/// Every failure kind uses the same schedule. Kinds only change what gets
/// logged. When `max_attempts` exceeds the schedule length the last delay is
/// reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts per tick (including the first).
    pub max_attempts: u32,
    /// Delay before the retry that follows attempt i (0-based).
    pub delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delays: vec![
                Duration::from_secs(30),
                Duration::from_secs(120),
                Duration::from_secs(300),
            ],
        }
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            delays: cfg.delays_secs.iter().map(|s| Duration::from_secs(*s)).collect(),
        }
    }

    /// Decide what to do after attempt `attempt_index` (0-based) failed with `kind`.
    ///
    /// Pure: the answer depends only on the arguments and the policy's fixed parameters.
    pub fn decide(&self, attempt_index: u32, kind: FailureKind) -> RetryDecision {
        if attempt_index.saturating_add(1) >= self.max_attempts {
            return RetryDecision::GiveUp;
        }
        match kind {
            FailureKind::RateLimited
            | FailureKind::ConfigUnavailable
            | FailureKind::Timeout
            | FailureKind::Unknown => {
                let delay = self
                    .delays
                    .get(attempt_index as usize)
                    .or_else(|| self.delays.last())
                    .copied()
                    .unwrap_or_default();
                RetryDecision::RetryAfter(delay)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [FailureKind; 4] = [
        FailureKind::RateLimited,
        FailureKind::ConfigUnavailable,
        FailureKind::Timeout,
        FailureKind::Unknown,
    ];

    #[test]
    fn default_schedule() {
        let p = RetryPolicy::default();
        assert_eq!(
            p.decide(0, FailureKind::RateLimited),
            RetryDecision::RetryAfter(Duration::from_secs(30))
        );
        assert_eq!(
            p.decide(1, FailureKind::RateLimited),
            RetryDecision::RetryAfter(Duration::from_secs(120))
        );
        assert_eq!(p.decide(2, FailureKind::RateLimited), RetryDecision::GiveUp);
    }

    #[test]
    fn delays_are_kind_agnostic() {
        let p = RetryPolicy::default();
        for attempt in 0..3 {
            let first = p.decide(attempt, ALL_KINDS[0]);
            for kind in ALL_KINDS {
                assert_eq!(p.decide(attempt, kind), first);
            }
        }
    }

    #[test]
    fn respects_max_attempts() {
        let mut p = RetryPolicy::default();
        p.max_attempts = 1;
        assert_eq!(p.decide(0, FailureKind::Timeout), RetryDecision::GiveUp);
        assert_eq!(p.decide(u32::MAX, FailureKind::Timeout), RetryDecision::GiveUp);
    }

    #[test]
    fn last_delay_reused_past_schedule() {
        let p = RetryPolicy {
            max_attempts: 6,
            delays: vec![Duration::from_secs(1), Duration::from_secs(2)],
        };
        assert_eq!(
            p.decide(4, FailureKind::Unknown),
            RetryDecision::RetryAfter(Duration::from_secs(2))
        );
        assert_eq!(p.decide(5, FailureKind::Unknown), RetryDecision::GiveUp);
    }

    #[test]
    fn from_config_clamps_attempts() {
        let p = RetryPolicy::from_config(&RetryConfig {
            max_attempts: 0,
            delays_secs: vec![5],
        });
        assert_eq!(p.max_attempts, 1);
        assert_eq!(p.delays, vec![Duration::from_secs(5)]);
    }
}
