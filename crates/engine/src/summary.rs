//! # Summary Aggregation
//!
//! Per-agent duration summaries and fleet-wide KPIs, computed over
//! consolidated segments. Also folds the API-side per-agent summaries into
//! the headline card totals and the status distribution.
//!
//! Percentages are whole numbers rounded half up. A fleet with no tracked
//! time reports `0` everywhere rather than dividing by zero.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::clock::Clock;
use crate::consolidation::{consolidate, consolidate_by_agent, DEFAULT_MICRO_EVENT_THRESHOLD_SECS};
use crate::model::{AgentStatus, ApiAgentSummary, StateInterval};

/// Accumulated seconds per status for one agent
///
/// Always carries all four statuses, zero when unseen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AgentSummary {
    durations: BTreeMap<AgentStatus, u64>,
}

impl AgentSummary {
    pub fn new() -> Self {
        Self {
            durations: AgentStatus::ALL.iter().map(|status| (*status, 0)).collect(),
        }
    }

    pub fn add(&mut self, status: AgentStatus, seconds: u64) {
        *self.durations.entry(status).or_insert(0) += seconds;
    }

    pub fn get(&self, status: AgentStatus) -> u64 {
        self.durations.get(&status).copied().unwrap_or(0)
    }

    /// Sum across all statuses
    pub fn total(&self) -> u64 {
        self.durations.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgentStatus, u64)> + '_ {
        self.durations.iter().map(|(status, seconds)| (*status, *seconds))
    }
}

impl Default for AgentSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-status totals for one agent's intervals, consolidated at 60s
pub fn agent_summary<E: StateInterval>(events: &[E], clock: &dyn Clock) -> AgentSummary {
    agent_summary_with_threshold(events, DEFAULT_MICRO_EVENT_THRESHOLD_SECS, clock)
}

/// Per-status totals for one agent's intervals
pub fn agent_summary_with_threshold<E: StateInterval>(
    events: &[E],
    micro_threshold_secs: u64,
    clock: &dyn Clock,
) -> AgentSummary {
    let mut summary = AgentSummary::new();
    for segment in consolidate(events, micro_threshold_secs, clock) {
        summary.add(segment.status, segment.duration);
    }
    summary
}

/// Fleet-wide KPIs for one day
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetMetrics {
    /// Consolidated Disconnect segments across all agents
    pub total_disconnections: usize,
    pub available_percentage: u32,
    pub busy_percentage: u32,
    /// Offline and Disconnect time together
    pub offline_percentage: u32,
    /// Disconnect time alone
    pub disconnect_percentage: u32,
    /// Longest single consolidated Available segment, in seconds
    pub longest_continuous_available: u64,
    pub total_duration: u64,
    pub status_seconds: AgentSummary,
    pub agent_count: usize,
}

/// Fleet KPIs with the default 60s consolidation threshold
pub fn fleet_metrics<E: StateInterval>(events: &[E], clock: &dyn Clock) -> FleetMetrics {
    fleet_metrics_with_threshold(events, DEFAULT_MICRO_EVENT_THRESHOLD_SECS, clock)
}

/// Fleet KPIs: every agent consolidated independently, then pooled
pub fn fleet_metrics_with_threshold<E: StateInterval>(
    events: &[E],
    micro_threshold_secs: u64,
    clock: &dyn Clock,
) -> FleetMetrics {
    let by_agent = consolidate_by_agent(events, micro_threshold_secs, clock);

    let mut totals = AgentSummary::new();
    let mut total_disconnections = 0;
    let mut longest_continuous_available = 0;

    for segment in by_agent.values().flatten() {
        totals.add(segment.status, segment.duration);
        match segment.status {
            AgentStatus::Available => {
                longest_continuous_available = longest_continuous_available.max(segment.duration);
            }
            AgentStatus::Disconnect => total_disconnections += 1,
            AgentStatus::Busy | AgentStatus::Offline => {}
        }
    }

    let total_duration = totals.total();
    let disconnect = totals.get(AgentStatus::Disconnect);

    debug!(
        "Fleet metrics over {} agents: {}s tracked, {} disconnections",
        by_agent.len(),
        total_duration,
        total_disconnections
    );

    FleetMetrics {
        total_disconnections,
        available_percentage: percentage(totals.get(AgentStatus::Available), total_duration),
        busy_percentage: percentage(totals.get(AgentStatus::Busy), total_duration),
        offline_percentage: percentage(totals.get(AgentStatus::Offline) + disconnect, total_duration),
        disconnect_percentage: percentage(disconnect, total_duration),
        longest_continuous_available,
        total_duration,
        status_seconds: totals,
        agent_count: by_agent.len(),
    }
}

/// `round(part / total * 100)`, `0` when nothing is tracked
pub fn percentage(part: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}

/// Headline card totals derived from the API-side summaries
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryTotals {
    pub total_available: u64,
    pub total_busy: u64,
    /// Offline and Disconnect time together
    pub total_offline: u64,
    pub total_duration: u64,
    pub agent_count: usize,
    pub avg_available: f64,
    pub avg_offline: f64,
    pub available_percentage: u32,
}

/// Fold per-agent API summaries into fleet totals
pub fn summary_totals(summaries: &BTreeMap<String, ApiAgentSummary>) -> SummaryTotals {
    let mut totals = AgentSummary::new();
    for summary in summaries.values() {
        for status in AgentStatus::ALL {
            totals.add(status, summary.seconds_for(status));
        }
    }

    let agent_count = summaries.len();
    let total_available = totals.get(AgentStatus::Available);
    let total_offline = totals.get(AgentStatus::Offline) + totals.get(AgentStatus::Disconnect);
    let total_duration = totals.total();
    let average = |seconds: u64| {
        if agent_count == 0 {
            0.0
        } else {
            seconds as f64 / agent_count as f64
        }
    };

    SummaryTotals {
        total_available,
        total_busy: totals.get(AgentStatus::Busy),
        total_offline,
        total_duration,
        agent_count,
        avg_available: average(total_available),
        avg_offline: average(total_offline),
        available_percentage: percentage(total_available, total_duration),
    }
}

/// One slice of the status distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusShare {
    pub status: AgentStatus,
    pub seconds: u64,
    /// Seconds rounded to whole minutes
    pub minutes: u64,
}

/// Total time per status across every agent summary
///
/// Statuses with no reported time are left out.
pub fn status_distribution(summaries: &BTreeMap<String, ApiAgentSummary>) -> Vec<StatusShare> {
    AgentStatus::ALL
        .iter()
        .map(|status| {
            let seconds: u64 = summaries.values().map(|summary| summary.seconds_for(*status)).sum();
            StatusShare {
                status: *status,
                seconds,
                minutes: (seconds + 30) / 60,
            }
        })
        .filter(|share| share.seconds > 0)
        .collect()
}
