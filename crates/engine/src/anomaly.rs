//! # Anomaly Detection
//!
//! Rule-based alerts raised per agent for a supervisor to look at. Rules are
//! independent and additive; an agent with no alert is left out of the
//! [`AlertRecord`] entirely.
//!
//! | Rule | Input | Default trigger |
//! |------|-------|-----------------|
//! | Frequent disconnects | raw events | ≥ 5 Disconnect records |
//! | Multiple disconnects | raw events | ≥ 3 (only when not frequent) |
//! | Long offline | consolidated segments | first Offline segment > 20 min |
//! | Very short session | consolidated segments | > 1 segment and total < 5 min |
//!
//! Disconnects are counted on the raw records on purpose: consolidation
//! absorbs brief drops, which is exactly what this rule must still see.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::clock::Clock;
use crate::config::AlertConfig;
use crate::consolidation::{consolidate, DEFAULT_MICRO_EVENT_THRESHOLD_SECS};
use crate::model::{group_by_agent, AgentStatus, StateInterval};
use crate::time::format_duration_short;

/// A single alert raised for an agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    FrequentDisconnects { count: usize },
    MultipleDisconnects { count: usize },
    /// Duration of the offending Offline segment, in seconds
    LongOffline { duration: u64 },
    /// Total tracked seconds for the day
    ShortSession { total: u64 },
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::FrequentDisconnects { count } => {
                write!(f, "Frequent disconnects ({} times today)", count)
            }
            Alert::MultipleDisconnects { count } => write!(f, "Multiple disconnects ({} times)", count),
            Alert::LongOffline { duration } => {
                write!(f, "Agent offline >{} during shift", format_duration_short(*duration))
            }
            Alert::ShortSession { total } => {
                write!(f, "Very short work session ({})", format_duration_short(*total))
            }
        }
    }
}

impl Serialize for Alert {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Alerts keyed by agent, in rule order per agent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AlertRecord {
    alerts: BTreeMap<String, Vec<Alert>>,
}

impl AlertRecord {
    /// Alerts for `agent`; empty when the agent raised none
    pub fn get(&self, agent: &str) -> &[Alert] {
        self.alerts.get(agent).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Alert])> {
        self.alerts.iter().map(|(agent, alerts)| (agent.as_str(), alerts.as_slice()))
    }

    /// Number of agents with at least one alert
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Rendered alert strings keyed by agent
    pub fn messages(&self) -> BTreeMap<String, Vec<String>> {
        self.alerts
            .iter()
            .map(|(agent, alerts)| (agent.clone(), alerts.iter().map(Alert::to_string).collect()))
            .collect()
    }

    fn insert(&mut self, agent: &str, alerts: Vec<Alert>) {
        if !alerts.is_empty() {
            self.alerts.insert(agent.to_string(), alerts);
        }
    }
}

/// Run every rule with the default thresholds
pub fn detect<E: StateInterval>(events: &[E], clock: &dyn Clock) -> AlertRecord {
    detect_with(events, &AlertConfig::default(), DEFAULT_MICRO_EVENT_THRESHOLD_SECS, clock)
}

/// Run every rule with explicit thresholds
pub fn detect_with<E: StateInterval>(
    events: &[E],
    config: &AlertConfig,
    micro_threshold_secs: u64,
    clock: &dyn Clock,
) -> AlertRecord {
    let groups = group_by_agent(events);
    let agent_count = groups.len();

    let mut record = AlertRecord::default();
    for (agent, group) in groups {
        record.insert(agent, agent_alerts(&group, config, micro_threshold_secs, clock));
    }

    debug!("{} of {} agents raised alerts", record.len(), agent_count);
    record
}

/// Alerts for a single agent's intervals
pub fn agent_alerts<E: StateInterval>(
    events: &[E],
    config: &AlertConfig,
    micro_threshold_secs: u64,
    clock: &dyn Clock,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    let disconnects = events
        .iter()
        .filter(|event| event.status() == AgentStatus::Disconnect)
        .count();
    if disconnects >= config.frequent_disconnects {
        alerts.push(Alert::FrequentDisconnects { count: disconnects });
    } else if disconnects >= config.multiple_disconnects {
        alerts.push(Alert::MultipleDisconnects { count: disconnects });
    }

    let segments = consolidate(events, micro_threshold_secs, clock);

    let long_offline = segments
        .iter()
        .find(|segment| segment.status == AgentStatus::Offline && segment.duration > config.long_offline_secs);
    if let Some(segment) = long_offline {
        alerts.push(Alert::LongOffline {
            duration: segment.duration,
        });
    }

    let total: u64 = segments.iter().map(|segment| segment.duration).sum();
    if segments.len() > 1 && total < config.short_session_secs {
        alerts.push(Alert::ShortSession { total });
    }

    alerts
}
