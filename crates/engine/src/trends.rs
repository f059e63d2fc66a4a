//! Hourly activity trends
//!
//! Twenty-four local-hour buckets; an interval counts once in every hour it
//! touches, from its start hour through its end hour.

use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;
use tracing::debug;

use crate::clock::Clock;
use crate::model::{AgentStatus, StateInterval};
use crate::time::{is_live, to_instant};

/// Status occurrences within one local hour
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyActivity {
    pub hour: u32,
    /// `"HH:00"`
    pub label: String,
    pub available: u32,
    pub busy: u32,
    pub offline: u32,
    pub disconnect: u32,
}

impl HourlyActivity {
    fn new(hour: u32) -> Self {
        Self {
            hour,
            label: format!("{:02}:00", hour),
            ..Default::default()
        }
    }

    pub fn count(&self, status: AgentStatus) -> u32 {
        match status {
            AgentStatus::Available => self.available,
            AgentStatus::Busy => self.busy,
            AgentStatus::Offline => self.offline,
            AgentStatus::Disconnect => self.disconnect,
        }
    }

    pub fn total(&self) -> u32 {
        self.available + self.busy + self.offline + self.disconnect
    }

    fn record(&mut self, status: AgentStatus) {
        match status {
            AgentStatus::Available => self.available += 1,
            AgentStatus::Busy => self.busy += 1,
            AgentStatus::Offline => self.offline += 1,
            AgentStatus::Disconnect => self.disconnect += 1,
        }
    }
}

/// Bucket intervals by the local hours they span
///
/// Intervals with an unparseable start or end are skipped, as are intervals
/// whose end hour precedes their start hour.
pub fn hourly_activity<E: StateInterval>(events: &[E], clock: &dyn Clock) -> Vec<HourlyActivity> {
    let mut hours: Vec<HourlyActivity> = (0..24).map(HourlyActivity::new).collect();
    let mut skipped = 0usize;

    for event in events {
        let Some(start) = to_instant(event.start_time()).map(|instant| local_hour(instant, clock)) else {
            skipped += 1;
            continue;
        };

        let end_instant = if is_live(event.end_time()) {
            Some(clock.now())
        } else {
            event.end_time().and_then(to_instant)
        };
        let Some(end) = end_instant.map(|instant| local_hour(instant, clock)) else {
            skipped += 1;
            continue;
        };

        for bucket in hours.iter_mut().take(end as usize + 1).skip(start as usize) {
            bucket.record(event.status());
        }
    }

    if skipped > 0 {
        debug!("Skipped {} intervals with unreadable timestamps", skipped);
    }

    hours
}

fn local_hour(instant: DateTime<Utc>, clock: &dyn Clock) -> u32 {
    instant.with_timezone(&clock.local_offset(instant)).hour()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::model::RawStateEvent;
    use chrono::{TimeZone, Utc};

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap())
    }

    #[test]
    fn test_buckets_and_labels() {
        let hours = hourly_activity::<RawStateEvent>(&[], &clock());
        assert_eq!(hours.len(), 24);
        assert_eq!(hours[0].label, "00:00");
        assert_eq!(hours[9].label, "09:00");
        assert_eq!(hours[23].hour, 23);
        assert!(hours.iter().all(|hour| hour.total() == 0));
    }

    #[test]
    fn test_interval_counts_every_touched_hour() {
        let events = vec![
            RawStateEvent::new("Ana", AgentStatus::Busy, "2024-03-01T09:15:00", Some("2024-03-01T11:05:00")),
            RawStateEvent::new("Bo", AgentStatus::Busy, "2024-03-01T10:00:00", Some("2024-03-01T10:30:00")),
            RawStateEvent::new("Bo", AgentStatus::Disconnect, "2024-03-01T10:30:00", Some("2024-03-01T10:31:00")),
        ];

        let hours = hourly_activity(&events, &clock());
        assert_eq!(hours[8].total(), 0);
        assert_eq!(hours[9].count(AgentStatus::Busy), 1);
        assert_eq!(hours[10].count(AgentStatus::Busy), 2);
        assert_eq!(hours[10].count(AgentStatus::Disconnect), 1);
        assert_eq!(hours[11].count(AgentStatus::Busy), 1);
        assert_eq!(hours[12].total(), 0);
    }

    #[test]
    fn test_live_interval_runs_to_now() {
        let events = vec![RawStateEvent::new("Ana", AgentStatus::Available, "2024-03-01T12:10:00", None)];
        let hours = hourly_activity(&events, &clock());
        assert_eq!(hours[12].available, 1);
        assert_eq!(hours[13].available, 1);
        assert_eq!(hours[14].available, 1);
        assert_eq!(hours[15].available, 0);
    }

    #[test]
    fn test_backwards_and_unreadable_intervals_are_ignored() {
        let events = vec![
            RawStateEvent::new("Ana", AgentStatus::Busy, "2024-03-01T23:30:00", Some("2024-03-02T00:30:00")),
            RawStateEvent::new("Ana", AgentStatus::Busy, "garbage", Some("2024-03-01T10:00:00")),
            RawStateEvent::new("Ana", AgentStatus::Busy, "2024-03-01T10:00:00", Some("garbage")),
        ];
        let hours = hourly_activity(&events, &clock());
        assert!(hours.iter().all(|hour| hour.total() == 0));
    }
}
