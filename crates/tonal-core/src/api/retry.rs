//! Retry policy and per-attempt classification.

use std::time::Duration;

use super::error::{ClientError, Result};
use crate::config::ClientConfig;

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Option<Duration>,
}

impl RetryPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.initial_backoff,
            max_delay: config.max_backoff,
        }
    }

    /// Delay after failed attempt `attempt` (1-based): `base * 2^(attempt-1)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let delay = self.base_delay.saturating_mul(1u32 << exponent);
        match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

/// Result of one attempt, tagged with whether another attempt could help.
#[derive(Debug)]
pub enum AttemptOutcome<T> {
    Ok(T),
    Retryable(ClientError),
    Fatal(ClientError),
}

impl<T> AttemptOutcome<T> {
    pub fn classify(result: Result<T>) -> Self {
        match result {
            Ok(value) => AttemptOutcome::Ok(value),
            Err(err) if err.is_retryable() => AttemptOutcome::Retryable(err),
            Err(err) => AttemptOutcome::Fatal(err),
        }
    }
}
