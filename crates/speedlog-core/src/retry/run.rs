//! One tick: invoke until success or the policy gives up, sleeping between attempts.

use super::policy::{RetryDecision, RetryPolicy};
use super::state::RetryState;
use crate::control::Shutdown;
use crate::invoker::{FailureKind, MeasurementInvoker, MeasurementOutcome};
use crate::record::{self, MeasurementResult};

/// How a tick ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// A row to append: a measurement, or the ERROR marker after exhausting retries.
    Completed(MeasurementResult),
    /// Shutdown fired during the tool call or a retry sleep; nothing is recorded.
    Interrupted,
}

/// Runs `invoker` until it succeeds or `policy` says to give up.
/// On retryable failure, sleeps for the scheduled delay then tries again.
pub async fn run_with_retry<I>(
    invoker: &I,
    policy: &RetryPolicy,
    shutdown: &mut Shutdown,
) -> TickOutcome
where
    I: MeasurementInvoker,
{
    let mut state = RetryState::new(policy.max_attempts);
    loop {
        tracing::info!(
            attempt = state.attempt_number(),
            max_attempts = state.max_attempts(),
            "starting speed test (attempt {}/{})",
            state.attempt_number(),
            state.max_attempts()
        );

        let outcome = tokio::select! {
            outcome = invoker.invoke() => outcome,
            _ = shutdown.wait() => {
                tracing::info!(
                    attempt = state.attempt_number(),
                    "speed test interrupted; tick abandoned"
                );
                return TickOutcome::Interrupted;
            }
        };

        let (kind, detail) = match outcome {
            MeasurementOutcome::Success { metrics, server } => {
                tracing::info!(
                    attempt = state.attempt_number(),
                    "speed test completed: {} Mbps down, {} Mbps up, {} ms ping",
                    record::format_value(metrics.download_mbps),
                    record::format_value(metrics.upload_mbps),
                    record::format_value(metrics.ping_ms)
                );
                return TickOutcome::Completed(MeasurementResult::success(
                    record::now(),
                    metrics,
                    server,
                ));
            }
            MeasurementOutcome::Failure { kind, detail } => (kind, detail),
        };

        log_failure(&state, kind, &detail);
        state.record_failure(kind);

        match policy.decide(state.attempt, kind) {
            RetryDecision::GiveUp => {
                tracing::error!(
                    attempts = state.attempt_number(),
                    kind = %kind,
                    "speed test failed after all retries: {}",
                    detail
                );
                return TickOutcome::Completed(MeasurementResult::error(record::now()));
            }
            RetryDecision::RetryAfter(delay) => {
                tracing::info!(
                    attempt = state.attempt_number(),
                    kind = %kind,
                    delay_secs = delay.as_secs_f64(),
                    "waiting {} seconds before retry",
                    delay.as_secs()
                );
                if !shutdown.sleep(delay).await {
                    tracing::info!("retry wait interrupted; tick abandoned");
                    return TickOutcome::Interrupted;
                }
                state.advance();
            }
        }
    }
}

fn log_failure(state: &RetryState, kind: FailureKind, detail: &str) {
    let attempt = state.attempt_number();
    match kind {
        FailureKind::RateLimited => {
            tracing::warn!(attempt, kind = %kind, "HTTP 403 on attempt {}: rate limited", attempt)
        }
        FailureKind::ConfigUnavailable => tracing::warn!(
            attempt,
            kind = %kind,
            "configuration error on attempt {}: {}",
            attempt,
            detail
        ),
        FailureKind::Timeout => {
            tracing::warn!(attempt, kind = %kind, "speed test timed out on attempt {}", attempt)
        }
        FailureKind::Unknown => tracing::warn!(
            attempt,
            kind = %kind,
            "speed test failed on attempt {}: {}",
            attempt,
            detail
        ),
    }
}
