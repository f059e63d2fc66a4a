//! # Timeline Projection
//!
//! Maps segments onto a horizontal business-hours window as percentage
//! offsets, ready for absolute positioning:
//!
//! ```text
//!   09:00                                                     18:00
//!     |----[Available======]--[Busy===]-----[Offline]--[Avail~~~~|
//!     ^ left = 0%            ^ left = (start - 09:00) / 9h * 100
//! ```
//!
//! Placement uses local time of day from the injected [`Clock`]. Live
//! segments extend to the clock's current instant.

use serde::Serialize;
use tracing::debug;

use crate::anomaly::{agent_alerts, Alert};
use crate::clock::Clock;
use crate::config::AnalyticsConfig;
use crate::consolidation::consolidate;
use crate::model::{group_by_agent, AgentStatus, ConsolidatedSegment, StateInterval};
use crate::time::{local_seconds_since_midnight, seconds_since_midnight};

/// Narrowest bar the default projection draws, in percent
pub const DEFAULT_MIN_BAR_WIDTH_PERCENT: f64 = 1.0;

const SECONDS_PER_HOUR: i64 = 3600;

/// One positioned bar
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineBar {
    pub status: AgentStatus,
    /// Offset from the window start, percent in `[0, 100]`
    pub left: f64,
    /// Percent of the window, never below the minimum bar width
    ///
    /// Only the minimum width can push a bar past the window edge, so
    /// `left + width <= 100 + min_width` always holds. A segment starting
    /// exactly at the window end shows as a sliver at `left = 100`.
    pub width: f64,
    pub is_live: bool,
    pub start_time: String,
    pub end_time: Option<String>,
    /// Seconds covered by the underlying segment
    pub duration: u64,
}

/// Project segments onto `[window_start_hour, window_end_hour)` local time
pub fn project(
    segments: &[ConsolidatedSegment],
    window_start_hour: u32,
    window_end_hour: u32,
    clock: &dyn Clock,
) -> Vec<TimelineBar> {
    project_with(
        segments,
        window_start_hour,
        window_end_hour,
        DEFAULT_MIN_BAR_WIDTH_PERCENT,
        clock,
    )
}

/// [`project`] with an explicit minimum bar width
///
/// A zero-length or inverted window yields no bars.
pub fn project_with(
    segments: &[ConsolidatedSegment],
    window_start_hour: u32,
    window_end_hour: u32,
    min_width_percent: f64,
    clock: &dyn Clock,
) -> Vec<TimelineBar> {
    let window_start = i64::from(window_start_hour) * SECONDS_PER_HOUR;
    let window_end = i64::from(window_end_hour) * SECONDS_PER_HOUR;
    let window_len = window_end - window_start;
    if window_len <= 0 {
        return Vec::new();
    }

    let now_seconds = i64::from(local_seconds_since_midnight(clock.now(), clock));

    segments
        .iter()
        .filter_map(|segment| {
            let is_live = segment.is_live();
            let start = i64::from(seconds_since_midnight(&segment.start_time, clock));
            let end = match segment.end_time.as_deref() {
                Some(end) if !is_live => i64::from(seconds_since_midnight(end, clock)),
                _ => now_seconds,
            };

            if end < window_start || start > window_end {
                return None;
            }

            let clipped_start = start.max(window_start);
            let clipped_end = end.min(window_end);
            let left = (clipped_start - window_start) as f64 / window_len as f64 * 100.0;
            let width = (clipped_end - clipped_start) as f64 / window_len as f64 * 100.0;

            Some(TimelineBar {
                status: segment.status,
                left: left.max(0.0),
                width: width.max(min_width_percent),
                is_live,
                start_time: segment.start_time.clone(),
                end_time: segment.end_time.clone(),
                duration: segment.duration,
            })
        })
        .collect()
}

/// Axis labels from `start_hour` to `end_hour` inclusive, every `step_hours`
///
/// A zero step yields no labels.
pub fn time_labels(start_hour: u32, end_hour: u32, step_hours: u32) -> Vec<String> {
    if step_hours == 0 {
        return Vec::new();
    }
    (start_hour..=end_hour)
        .step_by(step_hours as usize)
        .map(|hour| format!("{:02}:00", hour))
        .collect()
}

/// Everything a supervisor's timeline row shows for one agent
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTimeline {
    pub agent: String,
    /// Bars after micro-event absorption
    pub segments: Vec<TimelineBar>,
    /// Bars with only same-status merging applied
    pub raw_segments: Vec<TimelineBar>,
    pub alerts: Vec<Alert>,
}

/// Timeline rows for every agent, sorted by agent key
pub fn agent_timelines<E: StateInterval>(
    events: &[E],
    config: &AnalyticsConfig,
    clock: &dyn Clock,
) -> Vec<AgentTimeline> {
    let threshold = config.consolidation.micro_event_threshold_secs;
    let window = &config.timeline;
    let bars = |segments: &[ConsolidatedSegment]| {
        project_with(
            segments,
            window.business_start_hour,
            window.business_end_hour,
            window.min_bar_width_percent,
            clock,
        )
    };

    let timelines: Vec<AgentTimeline> = group_by_agent(events)
        .into_iter()
        .map(|(agent, group)| AgentTimeline {
            agent: agent.to_string(),
            segments: bars(&consolidate(&group, threshold, clock)),
            raw_segments: bars(&consolidate(&group, 0, clock)),
            alerts: agent_alerts(&group, &config.alerts, threshold, clock),
        })
        .collect();

    debug!("Projected timelines for {} agents", timelines.len());
    timelines
}
