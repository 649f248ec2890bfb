//! Retry observation and logging

use std::fmt::Display;
use std::time::Duration;

/// Receives callbacks while a `RetryExecutor` runs
pub trait RetryObserver: Send + Sync {
    /// Called before each attempt (1-indexed)
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32);

    /// Called when an attempt failed and another will follow after `delay`
    fn on_attempt_failed(&self, attempt: u32, error: &dyn Display, delay: Duration);

    /// Called when an attempt succeeds
    fn on_success(&self, attempt: u32, total_duration: Duration);

    /// Called when the last allowed attempt failed
    fn on_exhausted(&self, attempts: u32, final_error: &dyn Display);

    /// Called when the predicate rejects an error as non-retryable
    fn on_cancelled(&self, attempt: u32, error: &dyn Display) {
        let _ = (attempt, error);
    }
}

/// An observer that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl RetryObserver for NoOpObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {}

    fn on_attempt_failed(&self, _attempt: u32, _error: &dyn Display, _delay: Duration) {}

    fn on_success(&self, _attempt: u32, _total_duration: Duration) {}

    fn on_exhausted(&self, _attempts: u32, _final_error: &dyn Display) {}
}

/// Logs retry events for one registry call
///
/// Retries are warnings; giving up is an error. A first-try success and the
/// start of each attempt are only visible at TRACE.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    call: String,
}

impl TracingObserver {
    pub fn new(call: impl Into<String>) -> Self {
        Self { call: call.into() }
    }
}

impl RetryObserver for TracingObserver {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        tracing::trace!(call = %self.call, attempt, max_attempts, "Calling registry");
    }

    fn on_attempt_failed(&self, attempt: u32, error: &dyn Display, delay: Duration) {
        tracing::warn!(
            call = %self.call,
            attempt,
            retry_in_ms = delay.as_millis() as u64,
            "Registry call failed: {}",
            error
        );
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        if attempt == 1 {
            tracing::trace!(call = %self.call, "Registry call succeeded");
        } else {
            tracing::info!(
                call = %self.call,
                attempt,
                elapsed_ms = total_duration.as_millis() as u64,
                "Registry call recovered"
            );
        }
    }

    fn on_exhausted(&self, attempts: u32, final_error: &dyn Display) {
        tracing::error!(
            call = %self.call,
            attempts,
            "Giving up on registry call: {}",
            final_error
        );
    }

    fn on_cancelled(&self, attempt: u32, error: &dyn Display) {
        tracing::debug!(call = %self.call, attempt, "Not retrying: {}", error);
    }
}
