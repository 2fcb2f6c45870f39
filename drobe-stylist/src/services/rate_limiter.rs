//! External-call rate limiter
//!
//! Gatekeeps all marketplace calls against two budgets: a minimum spacing
//! between consecutive calls and a rolling hourly ceiling. Acquisition and
//! recording are separate steps so a call that is skipped (cache hit) never
//! consumes budget. Denied requests are never queued or retried here; the
//! caller decides whether to surface the error or try again later.

use crate::clock::Clock;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

/// Why an acquisition was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Hourly call ceiling reached
    HourlyBudgetExhausted,
    /// Too soon after the previous call
    MinSpacing,
}

/// Result of `try_acquire`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    /// Caller may perform one external call, then must `record_call`
    Allowed,
    /// Budget unavailable; retry no sooner than `retry_after_ms`
    Denied {
        reason: DenyReason,
        retry_after_ms: u64,
    },
}

impl Acquisition {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Acquisition::Allowed)
    }
}

/// Snapshot of limiter state for diagnostics
#[derive(Debug, Clone)]
pub struct RateLimiterSnapshot {
    pub hourly_count: u32,
    pub window_started_at: DateTime<Utc>,
    pub last_call_at: Option<DateTime<Utc>>,
}

struct LimiterState {
    last_call_at: Option<DateTime<Utc>>,
    hourly_count: u32,
    window_started_at: DateTime<Utc>,
}

/// Process-wide call-budget gate; every external marketplace call goes
/// through one shared instance, there is no bypass path.
pub struct RateLimiter {
    state: Mutex<LimiterState>,
    max_per_hour: u32,
    min_spacing: Duration,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(max_per_hour: u32, min_spacing_ms: u64, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            state: Mutex::new(LimiterState {
                last_call_at: None,
                hourly_count: 0,
                window_started_at: now,
            }),
            max_per_hour,
            min_spacing: Duration::milliseconds(min_spacing_ms as i64),
            clock,
        }
    }

    /// Try to acquire permission for one external call.
    ///
    /// Does not consume budget; a successful caller reports the completed
    /// call via [`record_call`](Self::record_call).
    pub fn try_acquire(&self) -> Acquisition {
        let mut state = self.state.lock().unwrap();
        let now = self.clock.now();

        // Rolling hourly window: reset once an hour has fully elapsed
        if now - state.window_started_at >= Duration::hours(1) {
            state.hourly_count = 0;
            state.window_started_at = now;
        }

        if state.hourly_count >= self.max_per_hour {
            let window_ends = state.window_started_at + Duration::hours(1);
            let retry_after_ms = (window_ends - now).num_milliseconds().max(0) as u64;
            tracing::debug!(
                hourly_count = state.hourly_count,
                retry_after_ms,
                "Rate limit denial: hourly budget exhausted"
            );
            return Acquisition::Denied {
                reason: DenyReason::HourlyBudgetExhausted,
                retry_after_ms,
            };
        }

        if let Some(last) = state.last_call_at {
            let elapsed = now - last;
            if elapsed < self.min_spacing {
                let retry_after_ms = (self.min_spacing - elapsed).num_milliseconds().max(0) as u64;
                tracing::debug!(retry_after_ms, "Rate limit denial: minimum call spacing");
                return Acquisition::Denied {
                    reason: DenyReason::MinSpacing,
                    retry_after_ms,
                };
            }
        }

        Acquisition::Allowed
    }

    /// Report one completed external call, consuming budget.
    pub fn record_call(&self) {
        let mut state = self.state.lock().unwrap();
        let now = self.clock.now();
        state.hourly_count += 1;
        state.last_call_at = Some(now);
    }

    pub fn snapshot(&self) -> RateLimiterSnapshot {
        let state = self.state.lock().unwrap();
        RateLimiterSnapshot {
            hourly_count: state.hourly_count,
            window_started_at: state.window_started_at,
            last_call_at: state.last_call_at,
        }
    }
}
