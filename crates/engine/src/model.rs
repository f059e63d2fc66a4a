//! Core presence data types and the ingestion boundary
//!
//! Wire records ([`StateRecord`]) arrive exactly as the dashboard API emits
//! them: PascalCase keys with camelCase fallbacks, status strings that may use
//! the legacy `Disconnected` spelling, and durations that may be numbers,
//! formatted strings (`"2m 15s"`) or missing. [`StateRecord::normalize`] turns
//! them into [`RawStateEvent`]s carrying the canonical [`AgentStatus`]; the
//! rest of the engine only ever sees canonical values.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::error::{Result, StatusboardError};
use crate::time;

/// Agent name used when a record carries neither a name nor an id
pub const UNKNOWN_AGENT: &str = "Unknown";

/// Agent presence status
///
/// `Disconnected` is accepted as a legacy spelling of [`AgentStatus::Disconnect`]
/// and never produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentStatus {
    /// Agent is available for calls
    Available,

    /// Agent is handling a call
    Busy,

    /// Agent is signed out
    Offline,

    /// Agent's connection dropped
    #[serde(alias = "Disconnected")]
    Disconnect,
}

impl AgentStatus {
    /// Every canonical status, in display order
    pub const ALL: [AgentStatus; 4] = [
        AgentStatus::Available,
        AgentStatus::Busy,
        AgentStatus::Offline,
        AgentStatus::Disconnect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Available => "Available",
            AgentStatus::Busy => "Busy",
            AgentStatus::Offline => "Offline",
            AgentStatus::Disconnect => "Disconnect",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentStatus {
    type Err = StatusboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "available" | "Available" | "AVAILABLE" => Ok(AgentStatus::Available),
            "busy" | "Busy" | "BUSY" => Ok(AgentStatus::Busy),
            "offline" | "Offline" | "OFFLINE" => Ok(AgentStatus::Offline),
            "disconnect" | "Disconnect" | "DISCONNECT" | "disconnected" | "Disconnected"
            | "DISCONNECTED" => Ok(AgentStatus::Disconnect),
            other => Err(StatusboardError::invalid_status(other)),
        }
    }
}

/// Duration as supplied by the API: plain seconds or a formatted string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(f64),
    Text(String),
}

impl DurationValue {
    /// Whole positive seconds, or `None` when zero, negative or unreadable
    pub fn seconds(&self) -> Option<u64> {
        let seconds = match self {
            DurationValue::Seconds(value) => whole_seconds(*value),
            DurationValue::Text(text) => match text.trim().parse::<f64>() {
                Ok(value) => whole_seconds(value),
                Err(_) => Some(time::parse_duration_string(text)),
            },
        };
        seconds.filter(|secs| *secs > 0)
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_f64().map(DurationValue::Seconds),
            Value::String(text) => Some(DurationValue::Text(text.clone())),
            _ => None,
        }
    }
}

fn whole_seconds(value: f64) -> Option<u64> {
    if value.is_finite() && value > 0.0 {
        Some(value.floor() as u64)
    } else {
        None
    }
}

/// One status interval exactly as the dashboard API returns it
///
/// Decoding never fails on individual fields: wrong types and missing keys
/// become `None`/empty, and the status string is only checked at
/// [`StateRecord::normalize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct StateRecord {
    #[serde(rename = "AgentId")]
    pub agent_id: String,

    #[serde(rename = "AgentName", skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,

    #[serde(rename = "Status")]
    pub status: String,

    #[serde(rename = "StartTime", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,

    #[serde(rename = "EndTime")]
    pub end_time: Option<String>,

    #[serde(rename = "Duration", skip_serializing_if = "Option::is_none")]
    pub duration: Option<DurationValue>,
}

impl From<Map<String, Value>> for StateRecord {
    fn from(map: Map<String, Value>) -> Self {
        // PascalCase keys win; camelCase is the fallback spelling
        let field = |pascal: &str, camel: &str| {
            map.get(pascal)
                .filter(|value| !value.is_null())
                .or_else(|| map.get(camel).filter(|value| !value.is_null()))
        };

        Self {
            agent_id: field("AgentId", "agentId").and_then(lenient_string).unwrap_or_default(),
            agent_name: field("AgentName", "agentName").and_then(lenient_string),
            status: field("Status", "status").and_then(lenient_string).unwrap_or_default(),
            start_time: field("StartTime", "startTime").and_then(lenient_string),
            end_time: field("EndTime", "endTime").and_then(lenient_string),
            duration: field("Duration", "duration").and_then(DurationValue::from_json),
        }
    }
}

fn lenient_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl StateRecord {
    /// Convert into a canonical event, or `None` when the status is unknown
    pub fn normalize(&self) -> Option<RawStateEvent> {
        let status = match self.status.parse::<AgentStatus>() {
            Ok(status) => status,
            Err(e) => {
                warn!("Dropping state record for agent '{}': {}", self.agent_id, e);
                return None;
            }
        };

        let agent_name = self
            .agent_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .or_else(|| Some(self.agent_id.trim().to_string()).filter(|id| !id.is_empty()))
            .unwrap_or_else(|| UNKNOWN_AGENT.to_string());

        Some(RawStateEvent {
            agent_id: self.agent_id.clone(),
            agent_name,
            status,
            start_time: self.start_time.clone().unwrap_or_default(),
            end_time: self.end_time.clone(),
            duration: self.duration.as_ref().and_then(DurationValue::seconds),
        })
    }
}

/// Per-agent summary block computed by the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAgentSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,

    #[serde(default, deserialize_with = "lenient_counts")]
    pub state_counts: BTreeMap<String, u64>,

    #[serde(default, deserialize_with = "lenient_durations")]
    pub state_durations: BTreeMap<String, DurationValue>,
}

impl ApiAgentSummary {
    /// Total seconds reported for `status`, synonyms included
    pub fn seconds_for(&self, status: AgentStatus) -> u64 {
        self.state_durations
            .iter()
            .filter(|(key, _)| key.parse::<AgentStatus>().ok() == Some(status))
            .filter_map(|(_, value)| value.seconds())
            .sum()
    }

    /// Number of records reported for `status`, synonyms included
    pub fn count_for(&self, status: AgentStatus) -> u64 {
        self.state_counts
            .iter()
            .filter(|(key, _)| key.parse::<AgentStatus>().ok() == Some(status))
            .map(|(_, count)| *count)
            .sum()
    }
}

/// Decoded dashboard API response
///
/// Only the document shape is strict. A list item or summary entry that is
/// not an object is skipped with a warning, and summary values of the wrong
/// type are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardResponse {
    #[serde(default, deserialize_with = "lenient_items")]
    pub items: Vec<StateRecord>,

    #[serde(default, deserialize_with = "lenient_summaries")]
    pub summary: BTreeMap<String, ApiAgentSummary>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl DashboardResponse {
    /// Decode a response body
    pub fn from_json(body: &str) -> Result<Self> {
        let response: DashboardResponse = serde_json::from_str(body)?;
        if let Some(warning) = &response.warning {
            warn!("Dashboard API returned a warning: {}", warning);
        }
        Ok(response)
    }

    /// Canonical events for every record with a recognized status
    pub fn events(&self) -> Vec<RawStateEvent> {
        let events: Vec<RawStateEvent> = self.items.iter().filter_map(StateRecord::normalize).collect();
        debug!(
            "Normalized {} of {} state records",
            events.len(),
            self.items.len()
        );
        events
    }
}

fn lenient_items<'de, D>(deserializer: D) -> std::result::Result<Vec<StateRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match value {
            Value::Object(map) => Some(StateRecord::from(map)),
            other => {
                warn!("Skipping state record #{}: expected an object, got {}", index, other);
                None
            }
        })
        .collect())
}

fn lenient_summaries<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, ApiAgentSummary>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .filter_map(|(agent, value)| match serde_json::from_value::<ApiAgentSummary>(value) {
            Ok(summary) => Some((agent, summary)),
            Err(e) => {
                warn!("Skipping summary for agent '{}': {}", agent, e);
                None
            }
        })
        .collect())
}

fn lenient_counts<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .filter_map(|(status, value)| {
            let count = value
                .as_u64()
                .or_else(|| value.as_f64().and_then(whole_seconds));
            if count.is_none() {
                debug!("Ignoring state count for '{}': {}", status, value);
            }
            count.map(|count| (status, count))
        })
        .collect())
}

fn lenient_durations<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, DurationValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .filter_map(|(status, value)| {
            let duration = DurationValue::from_json(&value);
            if duration.is_none() {
                debug!("Ignoring state duration for '{}': {}", status, value);
            }
            duration.map(|duration| (status, duration))
        })
        .collect())
}

/// Read access shared by raw events and consolidated segments
pub trait StateInterval {
    fn agent_id(&self) -> &str;

    fn agent_name(&self) -> &str;

    fn status(&self) -> AgentStatus;

    fn start_time(&self) -> &str;

    fn end_time(&self) -> Option<&str>;

    /// Precomputed duration, if the source supplied one
    fn recorded_duration(&self) -> Option<u64>;

    /// Grouping key: the agent name, or the id when the name is blank
    fn agent_key(&self) -> &str {
        let name = self.agent_name();
        if name.trim().is_empty() {
            self.agent_id()
        } else {
            name
        }
    }

    fn is_live(&self) -> bool {
        time::is_live(self.end_time())
    }

    /// Recorded duration when positive, otherwise derived from the timestamps
    fn effective_duration(&self, clock: &dyn Clock) -> u64 {
        match self.recorded_duration() {
            Some(duration) if duration > 0 => duration,
            _ => time::elapsed_seconds(self.start_time(), self.end_time(), clock),
        }
    }
}

impl<E: StateInterval + ?Sized> StateInterval for &E {
    fn agent_id(&self) -> &str {
        (**self).agent_id()
    }

    fn agent_name(&self) -> &str {
        (**self).agent_name()
    }

    fn status(&self) -> AgentStatus {
        (**self).status()
    }

    fn start_time(&self) -> &str {
        (**self).start_time()
    }

    fn end_time(&self) -> Option<&str> {
        (**self).end_time()
    }

    fn recorded_duration(&self) -> Option<u64> {
        (**self).recorded_duration()
    }
}

/// One canonical status interval for one agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStateEvent {
    pub agent_id: String,
    pub agent_name: String,
    pub status: AgentStatus,
    pub start_time: String,
    /// `None` or empty while the session is live
    pub end_time: Option<String>,
    /// Authoritative seconds when present and positive
    pub duration: Option<u64>,
}

impl RawStateEvent {
    /// Create an event for an agent whose id and name coincide
    pub fn new(
        agent: impl Into<String>,
        status: AgentStatus,
        start_time: impl Into<String>,
        end_time: Option<&str>,
    ) -> Self {
        let agent = agent.into();
        Self {
            agent_id: agent.clone(),
            agent_name: agent,
            status,
            start_time: start_time.into(),
            end_time: end_time.map(str::to_string),
            duration: None,
        }
    }

    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = agent_id.into();
        self
    }

    pub fn with_duration(mut self, seconds: u64) -> Self {
        self.duration = Some(seconds);
        self
    }
}

impl StateInterval for RawStateEvent {
    fn agent_id(&self) -> &str {
        &self.agent_id
    }

    fn agent_name(&self) -> &str {
        &self.agent_name
    }

    fn status(&self) -> AgentStatus {
        self.status
    }

    fn start_time(&self) -> &str {
        &self.start_time
    }

    fn end_time(&self) -> Option<&str> {
        self.end_time.as_deref()
    }

    fn recorded_duration(&self) -> Option<u64> {
        self.duration
    }
}

/// A merged run of same-status intervals
///
/// Built fresh by every consolidation run and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedSegment {
    pub agent_id: String,
    pub agent_name: String,
    pub status: AgentStatus,
    pub start_time: String,
    pub end_time: Option<String>,
    /// Seconds covered by the merged range
    pub duration: u64,
}

impl ConsolidatedSegment {
    /// Open a segment from a single interval
    pub fn from_interval<E: StateInterval + ?Sized>(interval: &E, clock: &dyn Clock) -> Self {
        Self {
            agent_id: interval.agent_id().to_string(),
            agent_name: interval.agent_name().to_string(),
            status: interval.status(),
            start_time: interval.start_time().to_string(),
            end_time: interval.end_time().map(str::to_string),
            duration: interval.effective_duration(clock),
        }
    }

    /// Copy of this segment stretched to `end_time`
    pub fn extended_to(&self, end_time: Option<&str>, clock: &dyn Clock) -> Self {
        let end_time = end_time.map(str::to_string);
        let duration = time::elapsed_seconds(&self.start_time, end_time.as_deref(), clock);
        Self {
            end_time,
            duration,
            ..self.clone()
        }
    }
}

impl StateInterval for ConsolidatedSegment {
    fn agent_id(&self) -> &str {
        &self.agent_id
    }

    fn agent_name(&self) -> &str {
        &self.agent_name
    }

    fn status(&self) -> AgentStatus {
        self.status
    }

    fn start_time(&self) -> &str {
        &self.start_time
    }

    fn end_time(&self) -> Option<&str> {
        self.end_time.as_deref()
    }

    fn recorded_duration(&self) -> Option<u64> {
        Some(self.duration)
    }
}

impl From<ConsolidatedSegment> for RawStateEvent {
    fn from(segment: ConsolidatedSegment) -> Self {
        Self {
            agent_id: segment.agent_id,
            agent_name: segment.agent_name,
            status: segment.status,
            start_time: segment.start_time,
            end_time: segment.end_time,
            duration: Some(segment.duration),
        }
    }
}

/// Group intervals by [`StateInterval::agent_key`], preserving input order
/// within each group
pub fn group_by_agent<E: StateInterval>(events: &[E]) -> BTreeMap<&str, Vec<&E>> {
    let mut groups: BTreeMap<&str, Vec<&E>> = BTreeMap::new();
    for event in events {
        groups.entry(event.agent_key()).or_default().push(event);
    }
    groups
}
