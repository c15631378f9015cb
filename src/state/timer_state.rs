//! Discount countdown state and transitions

use serde::{Deserialize, Serialize};

use crate::pricing::{PricingPlan, PricingSnapshot};

/// Default discount window: 5 minutes
pub const DEFAULT_DISCOUNT_DURATION_MS: i64 = 5 * 60 * 1000;

/// Where the countdown is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    NotStarted,
    Active,
    Expired,
}

/// Countdown that gates the promotional price.
///
/// All times are epoch milliseconds. Remaining time is always recomputed from
/// the absolute start timestamp, never accumulated, so a suspended or
/// restarted process sees the correct value on its next evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    start_time: Option<i64>,
    duration_ms: i64,
    expired: bool,
    remaining_ms: i64,
}

impl TimerState {
    /// Create a timer that has not been started
    pub fn new(duration_ms: i64) -> Self {
        let duration_ms = duration_ms.max(0);
        Self {
            start_time: None,
            duration_ms,
            expired: false,
            remaining_ms: duration_ms,
        }
    }

    /// Open the discount window at `now`.
    ///
    /// Returns `true` only when this call actually started the window; an
    /// already started timer keeps its original start.
    pub fn start(&mut self, now: i64) -> bool {
        if self.start_time.is_some() {
            return false;
        }
        self.start_time = Some(now);
        self.expired = false;
        self.remaining_ms = self.duration_ms;
        true
    }

    /// Recompute remaining time at `now`.
    ///
    /// Returns `true` when this call is the one that observed expiry.
    pub fn tick(&mut self, now: i64) -> bool {
        let Some(start) = self.start_time else {
            return false;
        };
        if self.expired {
            self.remaining_ms = 0;
            return false;
        }
        self.remaining_ms = self.remaining_at(start, now);
        if self.remaining_ms == 0 && !self.expired {
            self.expired = true;
            return true;
        }
        false
    }

    /// Rehydrate from a stored start timestamp.
    ///
    /// Expiry is derived from elapsed wall-clock time only; a previously
    /// stored expired flag is never consulted.
    pub fn load_from_persisted_start(&mut self, saved_start: i64, now: i64) {
        self.start_time = Some(saved_start);
        self.expired = false;
        self.tick(now);
    }

    /// Return to the not-started state
    pub fn reset(&mut self) {
        self.start_time = None;
        self.expired = false;
        self.remaining_ms = self.duration_ms;
    }

    pub fn is_discount_active(&self) -> bool {
        self.start_time.is_some() && !self.expired
    }

    pub fn phase(&self) -> TimerPhase {
        match (self.start_time, self.expired) {
            (None, _) => TimerPhase::NotStarted,
            (Some(_), false) => TimerPhase::Active,
            (Some(_), true) => TimerPhase::Expired,
        }
    }

    /// Price figures for the current discount state
    pub fn price_snapshot(&self, plan: &PricingPlan) -> PricingSnapshot {
        plan.snapshot(self.is_discount_active())
    }

    pub fn start_time(&self) -> Option<i64> {
        self.start_time
    }

    pub fn duration_ms(&self) -> i64 {
        self.duration_ms
    }

    pub fn expired(&self) -> bool {
        self.expired
    }

    /// Remaining time as of the last `start`, `tick` or load
    pub fn remaining_ms(&self) -> i64 {
        self.remaining_ms
    }

    // A clock that went backwards clamps to the full window.
    fn remaining_at(&self, start: i64, now: i64) -> i64 {
        let elapsed = now.saturating_sub(start);
        self.duration_ms.saturating_sub(elapsed).clamp(0, self.duration_ms)
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(DEFAULT_DISCOUNT_DURATION_MS)
    }
}
