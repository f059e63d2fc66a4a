//! Time sources
//!
//! Live sessions (an interval with no end time) are measured against "now",
//! and time-of-day placement needs the viewer's local offset. Both come from
//! a [`Clock`] handed to every operation.

use chrono::{DateTime, Duration, FixedOffset, Local, Offset, TimeZone, Utc};
use parking_lot::RwLock;

/// Source of the current instant and of the local UTC offset
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;

    /// Local offset in effect at `instant`
    ///
    /// Defaults to the host timezone.
    fn local_offset(&self, instant: DateTime<Utc>) -> FixedOffset {
        Local.offset_from_utc_datetime(&instant.naive_utc())
    }
}

/// Wall clock in the host timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock with a fixed local offset
///
/// Time only moves when [`ManualClock::advance`] or [`ManualClock::set`] is
/// called.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
    offset: FixedOffset,
}

impl ManualClock {
    /// Create a clock pinned at `now`, rendering local time as UTC
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_offset(now, utc_offset())
    }

    /// Create a clock pinned at `now` with an explicit local offset
    pub fn with_offset(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            now: RwLock::new(now),
            offset,
        }
    }

    /// Move the clock forward (or backward for negative durations)
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write();
        *now += by;
    }

    /// Jump to an absolute instant
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.write() = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }

    fn local_offset(&self, _instant: DateTime<Utc>) -> FixedOffset {
        self.offset
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}
