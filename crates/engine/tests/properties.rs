//! Property-based checks over randomly generated agent days

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use statusboard_engine::prelude::*;
use statusboard_engine::time::elapsed_seconds;
use statusboard_engine::timeline::DEFAULT_MIN_BAR_WIDTH_PERCENT;

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 23, 0, 0).unwrap())
}

fn status() -> impl Strategy<Value = AgentStatus> {
    prop_oneof![
        Just(AgentStatus::Available),
        Just(AgentStatus::Busy),
        Just(AgentStatus::Offline),
        Just(AgentStatus::Disconnect),
    ]
}

fn stamp(seconds: u32) -> String {
    format!(
        "2024-03-01T{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Back-to-back intervals for a single agent, starting at 08:00
fn agent_day(agent: &'static str) -> impl Strategy<Value = Vec<RawStateEvent>> {
    prop::collection::vec((status(), 1u32..1800, any::<bool>()), 1..25).prop_map(move |steps| {
        let mut cursor = 8 * 3600;
        let last = steps.len() - 1;
        steps
            .into_iter()
            .enumerate()
            .map(|(i, (status, length, live_tail))| {
                let start = stamp(cursor);
                cursor += length;
                let end = if i == last && live_tail { None } else { Some(stamp(cursor)) };
                RawStateEvent::new(agent, status, start, end.as_deref())
            })
            .collect()
    })
}

fn fleet_day() -> impl Strategy<Value = Vec<RawStateEvent>> {
    (agent_day("Ana"), agent_day("Bo")).prop_map(|(mut ana, bo)| {
        ana.extend(bo);
        ana
    })
}

proptest! {
    #[test]
    fn consolidation_is_idempotent(events in agent_day("Ana"), threshold in 0u64..600) {
        let clock = clock();
        let once = consolidate(&events, threshold, &clock);
        let twice = consolidate(&once, 0, &clock);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn consolidated_neighbours_differ(events in agent_day("Ana"), threshold in 0u64..600) {
        let segments = consolidate(&events, threshold, &clock());
        prop_assert!(!segments.is_empty());
        for pair in segments.windows(2) {
            prop_assert_ne!(pair[0].status, pair[1].status);
        }
    }

    #[test]
    fn elapsed_is_never_negative(start in 0u32..86_399, end in 0u32..86_399) {
        let end_stamp = stamp(end);
        let seconds = elapsed_seconds(&stamp(start), Some(end_stamp.as_str()), &clock());
        prop_assert_eq!(seconds, u64::from(end.saturating_sub(start)));
    }

    #[test]
    fn percentages_stay_in_bounds(events in fleet_day()) {
        let metrics = fleet_metrics(&events, &clock());
        for pct in [
            metrics.available_percentage,
            metrics.busy_percentage,
            metrics.offline_percentage,
            metrics.disconnect_percentage,
        ] {
            prop_assert!(pct <= 100);
        }

        if metrics.total_duration > 0 {
            let sum = metrics.available_percentage + metrics.busy_percentage + metrics.offline_percentage;
            prop_assert!((98..=102).contains(&sum), "percentages summed to {}", sum);
        }
    }

    #[test]
    fn summary_total_matches_segments(events in agent_day("Ana")) {
        let clock = clock();
        let summary = agent_summary(&events, &clock);
        let segments: u64 = consolidate(&events, 60, &clock).iter().map(|segment| segment.duration).sum();
        prop_assert_eq!(summary.total(), segments);
    }

    /// Bars start inside the window; only the minimum width may overhang it
    #[test]
    fn bars_stay_inside_the_window(events in agent_day("Ana")) {
        let clock = clock();
        for bar in project(&consolidate(&events, 0, &clock), 9, 18, &clock) {
            prop_assert!(bar.left >= 0.0 && bar.left <= 100.0);
            prop_assert!(bar.width >= DEFAULT_MIN_BAR_WIDTH_PERCENT);
            prop_assert!(
                bar.left + bar.width <= 100.0 + DEFAULT_MIN_BAR_WIDTH_PERCENT + 1e-9,
                "bar ends at {}%",
                bar.left + bar.width
            );
        }
    }
}

#[test]
fn empty_summary_has_every_status() {
    let summary = agent_summary::<RawStateEvent>(&[], &clock());
    for status in AgentStatus::ALL {
        assert_eq!(summary.get(status), 0);
    }
}
