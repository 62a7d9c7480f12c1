//! Wall-clock accounting for hosts that deliver ticks unreliably.
//!
//! Ticks arrive on a best-effort cadence. They may come faster or slower
//! than once a second, or stop entirely while the host is suspended (a
//! sleeping laptop, a throttled background task). The clock anchors to the
//! last instant it accounted for and converts wall-clock time into whole
//! seconds, carrying the sub-second remainder to the next tick so nothing
//! is lost or double counted.

use chrono::{DateTime, Duration, Local};

/// Wall-clock anchor with sub-second carry and suspend tracking
#[derive(Clone, Debug)]
pub struct Clock {
    /// Last instant already converted into session time
    anchor: Option<DateTime<Local>>,
    /// Milliseconds past `anchor` not yet applied
    carry_ms: i64,
    suspended_at: Option<DateTime<Local>>,
    /// Tick gaps longer than this are reported as suspensions
    gap_threshold: Duration,
}

impl Clock {
    pub fn new(gap_threshold_ms: u64) -> Self {
        Self {
            anchor: None,
            carry_ms: 0,
            suspended_at: None,
            gap_threshold: Duration::milliseconds(
                i64::try_from(gap_threshold_ms).unwrap_or(i64::MAX),
            ),
        }
    }

    /// Begin accounting from `now`, discarding any carry
    pub fn start(&mut self, now: DateTime<Local>) {
        self.anchor = Some(now);
        self.carry_ms = 0;
        self.suspended_at = None;
    }

    /// Stop accounting, e.g. when the session stops running
    pub fn stop(&mut self) {
        self.anchor = None;
        self.carry_ms = 0;
        self.suspended_at = None;
    }

    /// Whole seconds elapsed since the previous call (or `start`)
    ///
    /// The sub-second remainder is carried forward. A clock that moved
    /// backwards re-anchors and yields zero.
    pub fn advance(&mut self, now: DateTime<Local>) -> u64 {
        let Some(anchor) = self.anchor.replace(now) else {
            self.carry_ms = 0;
            return 0;
        };

        let gap = now - anchor;
        if gap < Duration::zero() {
            tracing::warn!(
                "Clock moved backwards by {}ms, re-anchoring",
                -gap.num_milliseconds()
            );
            self.carry_ms = 0;
            return 0;
        }
        if gap > self.gap_threshold {
            tracing::info!(
                "Tick gap of {}ms detected, treating as suspension",
                gap.num_milliseconds()
            );
        }

        let total = gap.num_milliseconds().saturating_add(self.carry_ms);
        self.carry_ms = total % 1000;
        u64::try_from(total / 1000).unwrap_or(0)
    }

    /// Remember when background suspension began
    pub fn on_suspend(&mut self, now: DateTime<Local>) {
        self.suspended_at = Some(now);
        tracing::debug!("Clock suspended at {}", now);
    }

    /// Whole seconds to apply after a suspension, or `None` if none was recorded
    ///
    /// Accounts from the last anchored instant (never later than the suspend
    /// timestamp), so time between the last tick and the suspension is
    /// included. The suspend timestamp is cleared.
    pub fn on_resume(&mut self, now: DateTime<Local>) -> Option<u64> {
        let suspended_at = self.suspended_at.take()?;
        if self.anchor.is_none() {
            self.start(suspended_at);
        }

        let elapsed = self.advance(now);
        tracing::debug!("Clock resumed after {}s", elapsed);
        Some(elapsed)
    }
}
