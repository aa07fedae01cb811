use crate::invoker::FailureKind;

/// Per-tick retry bookkeeping. Created fresh for every tick, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    /// 0-based index of the attempt about to run (or that just failed).
    pub attempt: u32,
    pub last_failure: Option<FailureKind>,
    /// Attempts left after the current one.
    pub remaining: u32,
    max_attempts: u32,
}

impl RetryState {
    pub fn new(max_attempts: u32) -> Self {
        let max_attempts = max_attempts.max(1);
        Self {
            attempt: 0,
            last_failure: None,
            remaining: max_attempts - 1,
            max_attempts,
        }
    }

    /// 1-based attempt number, for log lines.
    pub fn attempt_number(&self) -> u32 {
        self.attempt + 1
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn record_failure(&mut self, kind: FailureKind) {
        self.last_failure = Some(kind);
    }

    /// Move on to the next attempt.
    pub fn advance(&mut self) {
        self.attempt += 1;
        self.remaining = self.remaining.saturating_sub(1);
    }
}
