//! # State Consolidation
//!
//! Collapses an agent's raw status intervals into the runs a supervisor
//! actually cares about:
//!
//! ```text
//!   raw:     [Avail 09:00-09:05][Avail 09:05-09:10][Disc 30s][Avail 09:10:30-09:20]
//!                     \_______________ merge ______________/ \__ absorb __/
//!   result:  [Available 09:00 ---------------------------------------- 09:20]
//! ```
//!
//! Same-status neighbours merge regardless of any gap between them. An
//! interruption shorter than the micro-event threshold is absorbed into the
//! run it interrupts, provided that run resumes with the very next interval.
//! A short interval that leads into a different status keeps its own block.
//!
//! Every step builds a fresh [`ConsolidatedSegment`]; inputs are only read.

use std::collections::BTreeMap;

use tracing::debug;

use crate::clock::Clock;
use crate::model::{group_by_agent, ConsolidatedSegment, StateInterval};
use crate::time::to_instant;

/// Interruptions shorter than this many seconds are absorbed
pub const DEFAULT_MICRO_EVENT_THRESHOLD_SECS: u64 = 60;

/// Consolidate one agent's intervals
///
/// Intervals are ordered by start instant first (stable; unparseable starts
/// come first). A threshold of `0` disables micro-event absorption.
///
/// A micro-event is absorbed only when the interval after it has the status
/// of the open block; a trailing micro-event is never absorbed.
pub fn consolidate<E: StateInterval>(
    events: &[E],
    micro_threshold_secs: u64,
    clock: &dyn Clock,
) -> Vec<ConsolidatedSegment> {
    let mut ordered: Vec<&E> = events.iter().collect();
    ordered.sort_by_key(|event| to_instant(event.start_time()));

    let Some((first, rest)) = ordered.split_first() else {
        return Vec::new();
    };

    let mut segments = Vec::new();
    let mut current = ConsolidatedSegment::from_interval(*first, clock);

    for (i, event) in rest.iter().enumerate() {
        if event.status() == current.status {
            current = current.extended_to(event.end_time(), clock);
        } else if event.effective_duration(clock) < micro_threshold_secs
            && rest.get(i + 1).is_some_and(|next| next.status() == current.status)
        {
            // Micro-event: the interrupted run resumes right after it
            current = current.extended_to(event.end_time(), clock);
        } else {
            segments.push(current);
            current = ConsolidatedSegment::from_interval(*event, clock);
        }
    }
    segments.push(current);

    debug!(
        "Consolidated {} intervals into {} segments (threshold {}s)",
        events.len(),
        segments.len(),
        micro_threshold_secs
    );

    segments
}

/// Group intervals by agent and consolidate each group independently
pub fn consolidate_by_agent<E: StateInterval>(
    events: &[E],
    micro_threshold_secs: u64,
    clock: &dyn Clock,
) -> BTreeMap<String, Vec<ConsolidatedSegment>> {
    group_by_agent(events)
        .into_iter()
        .map(|(agent, group)| (agent.to_string(), consolidate(&group, micro_threshold_secs, clock)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::model::{AgentStatus, RawStateEvent};
    use chrono::{TimeZone, Utc};

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
    }

    fn event(status: AgentStatus, start: &str, end: Option<&str>) -> RawStateEvent {
        let end = end.map(|end| format!("2024-03-01T{end}"));
        RawStateEvent::new("Ana", status, format!("2024-03-01T{start}"), end.as_deref())
    }

    #[test]
    fn test_empty_and_single() {
        let clock = clock();
        let none: Vec<RawStateEvent> = Vec::new();
        assert!(consolidate(&none, 60, &clock).is_empty());

        let one = vec![event(AgentStatus::Busy, "09:00:00", Some("09:04:00"))];
        let segments = consolidate(&one, 60, &clock);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].duration, 240);
    }

    #[test]
    fn test_adjacent_same_status_merge() {
        let clock = clock();
        let events = vec![
            event(AgentStatus::Available, "09:00:00", Some("09:05:00")),
            event(AgentStatus::Available, "09:05:00", Some("09:10:00")),
        ];

        let segments = consolidate(&events, 60, &clock);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].status, AgentStatus::Available);
        assert_eq!(segments[0].start_time, "2024-03-01T09:00:00");
        assert_eq!(segments[0].end_time.as_deref(), Some("2024-03-01T09:10:00"));
        assert_eq!(segments[0].duration, 600);
    }

    #[test]
    fn test_micro_disconnect_absorbed() {
        let clock = clock();
        let events = vec![
            event(AgentStatus::Available, "09:00:00", Some("09:10:00")),
            event(AgentStatus::Disconnect, "09:10:00", Some("09:10:30")),
            event(AgentStatus::Available, "09:10:30", Some("09:20:00")),
        ];

        let segments = consolidate(&events, 60, &clock);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].status, AgentStatus::Available);
        assert_eq!(segments[0].end_time.as_deref(), Some("2024-03-01T09:20:00"));
        assert_eq!(segments[0].duration, 1200);
    }

    #[test]
    fn test_threshold_is_strict_and_zero_disables() {
        let clock = clock();
        let events = vec![
            event(AgentStatus::Available, "09:00:00", Some("09:10:00")),
            event(AgentStatus::Busy, "09:10:00", Some("09:11:00")),
            event(AgentStatus::Available, "09:11:00", Some("09:20:00")),
        ];

        // Exactly 60s is not a micro-event
        assert_eq!(consolidate(&events, 60, &clock).len(), 3);
        assert_eq!(consolidate(&events, 61, &clock).len(), 1);
        assert_eq!(consolidate(&events, 0, &clock).len(), 3);
    }

    #[test]
    fn test_authoritative_duration_decides_micro_events() {
        let clock = clock();
        let events = vec![
            event(AgentStatus::Available, "09:00:00", Some("09:10:00")),
            // Timestamps span 10 minutes but the recorded duration is 20s
            event(AgentStatus::Busy, "09:10:00", Some("09:20:00")).with_duration(20),
            event(AgentStatus::Available, "09:20:00", Some("09:30:00")),
        ];

        let segments = consolidate(&events, 60, &clock);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].duration, 1800);
    }

    #[test]
    fn test_micro_event_before_new_status_keeps_its_block() {
        let clock = clock();
        let events = vec![
            event(AgentStatus::Available, "09:00:00", Some("10:00:00")),
            event(AgentStatus::Disconnect, "10:00:00", Some("10:00:30")),
            event(AgentStatus::Busy, "10:00:30", Some("11:00:00")),
        ];

        let segments = consolidate(&events, 60, &clock);
        assert_eq!(
            segments
                .iter()
                .map(|segment| (segment.status, segment.duration))
                .collect::<Vec<_>>(),
            vec![
                (AgentStatus::Available, 3600),
                (AgentStatus::Disconnect, 30),
                (AgentStatus::Busy, 3570),
            ]
        );
    }

    #[test]
    fn test_trailing_micro_event_is_not_absorbed() {
        let clock = clock();
        let events = vec![
            event(AgentStatus::Available, "09:00:00", Some("09:10:00")),
            event(AgentStatus::Disconnect, "09:10:00", Some("09:10:20")),
        ];

        let segments = consolidate(&events, 60, &clock);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].status, AgentStatus::Disconnect);
        assert_eq!(segments[1].duration, 20);
    }

    #[test]
    fn test_gap_blind_merge() {
        let clock = clock();
        let events = vec![
            event(AgentStatus::Busy, "09:00:00", Some("09:05:00")),
            event(AgentStatus::Busy, "10:00:00", Some("10:05:00")),
        ];

        let segments = consolidate(&events, 60, &clock);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].duration, 65 * 60);
    }

    #[test]
    fn test_sorts_by_start_and_leaves_input_untouched() {
        let clock = clock();
        let events = vec![
            event(AgentStatus::Busy, "09:10:00", Some("09:20:00")),
            event(AgentStatus::Available, "09:00:00", Some("09:10:00")),
        ];
        let before = events.clone();

        let segments = consolidate(&events, 60, &clock);
        assert_eq!(events, before);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].status, AgentStatus::Available);
        assert_eq!(segments[1].status, AgentStatus::Busy);
    }

    #[test]
    fn test_live_block_measures_to_now() {
        let clock = clock();
        let events = vec![
            event(AgentStatus::Available, "11:00:00", Some("11:30:00")),
            event(AgentStatus::Available, "11:30:00", None),
        ];

        let segments = consolidate(&events, 60, &clock);
        assert_eq!(segments.len(), 1);
        assert!(segments[0].is_live());
        assert_eq!(segments[0].duration, 3600);
    }

    #[test]
    fn test_consolidate_by_agent() {
        let clock = clock();
        let mut events = vec![
            event(AgentStatus::Available, "09:00:00", Some("09:05:00")),
            event(AgentStatus::Available, "09:05:00", Some("09:10:00")),
        ];
        events.push(RawStateEvent::new(
            "Bo",
            AgentStatus::Busy,
            "2024-03-01T09:00:00",
            Some("2024-03-01T09:01:00"),
        ));

        let by_agent = consolidate_by_agent(&events, 60, &clock);
        assert_eq!(by_agent.len(), 2);
        assert_eq!(by_agent["Ana"].len(), 1);
        assert_eq!(by_agent["Ana"][0].duration, 600);
        assert_eq!(by_agent["Bo"][0].agent_name, "Bo");
    }
}
