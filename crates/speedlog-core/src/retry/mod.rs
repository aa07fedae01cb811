//! Retry and backoff policy.
//!
//! The policy is a pure function of (attempt index, failure kind); the
//! per-tick `RetryState` and the loop in `run` keep control flow out of the
//! invoker so the schedule can be tested with a fake measurement source.

mod policy;
mod run;
mod state;

pub use policy::{RetryDecision, RetryPolicy};
pub use run::{run_with_retry, TickOutcome};
pub use state::RetryState;
