//! Circuit breaker for provider rate limiting and IP bans.
//!
//! HTTP 403 trips the breaker immediately; repeated 429s or server errors trip
//! it after a threshold. While tripped, every request is refused until the
//! cooldown elapses.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct BreakerInner {
    tripped_at: Option<Instant>,
    consecutive_failures: u32,
}

/// Refuses requests for a cooldown period after the provider pushes back.
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<BreakerInner>,
    cooldown: Duration,
    failure_threshold: u32,
}

impl CircuitBreaker {
    pub fn new(cooldown: Duration, failure_threshold: u32) -> Self {
        Self {
            inner: Mutex::new(BreakerInner {
                tripped_at: None,
                consecutive_failures: 0,
            }),
            cooldown,
            failure_threshold: failure_threshold.max(1),
        }
    }

    /// 30-minute cooldown, trips after 3 consecutive failures.
    pub fn default_provider() -> Self {
        Self::new(Duration::from_secs(30 * 60), 3)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        // Counters stay valid after a poisoning panic.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Check if requests are currently allowed, resetting an expired trip.
    pub fn is_allowed(&self) -> bool {
        let mut inner = self.lock();
        match inner.tripped_at {
            None => true,
            Some(at) if at.elapsed() >= self.cooldown => {
                tracing::info!("circuit breaker cooldown expired, accepting requests again");
                inner.tripped_at = None;
                inner.consecutive_failures = 0;
                true
            }
            Some(_) => false,
        }
    }

    pub fn record_success(&self) {
        self.lock().consecutive_failures = 0;
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures += 1;
        if inner.consecutive_failures >= self.failure_threshold && inner.tripped_at.is_none() {
            tracing::warn!(
                failures = inner.consecutive_failures,
                "circuit breaker tripped after repeated provider failures"
            );
            inner.tripped_at = Some(Instant::now());
        }
    }

    /// Trip immediately (403 Forbidden).
    pub fn trip(&self) {
        tracing::warn!("circuit breaker tripped by provider ban");
        self.lock().tripped_at = Some(Instant::now());
    }

    /// Remaining cooldown (zero if not tripped).
    pub fn remaining_cooldown(&self) -> Duration {
        match self.lock().tripped_at {
            None => Duration::ZERO,
            Some(at) => self.cooldown.saturating_sub(at.elapsed()),
        }
    }
}
