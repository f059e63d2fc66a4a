//! # Statusboard Engine
//!
//! Bundles an [`AnalyticsConfig`] with a [`Clock`] so callers do not have to
//! thread thresholds and time sources through every call, and assembles the
//! full [`DashboardReport`] a supervisor view renders.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           StatusboardEngine             │
//! ├─────────────────────────────────────────┤
//! │  AnalyticsConfig  │  Arc<dyn Clock>     │
//! ├─────────────────────────────────────────┤
//! │ consolidation │ summary │ anomaly       │
//! │ timeline      │ trends  │ filter        │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use statusboard_engine::prelude::*;
//!
//! let engine = StatusboardEngine::builder()
//!     .with_config(AnalyticsConfig::default().with_business_hours(8, 17))
//!     .build()
//!     .unwrap();
//!
//! let events = vec![RawStateEvent::new(
//!     "Ana",
//!     AgentStatus::Available,
//!     "2024-03-01T09:00:00",
//!     Some("2024-03-01T09:30:00"),
//! )];
//!
//! let report = engine.report(&events);
//! assert_eq!(report.metrics.available_percentage, 100);
//! assert_eq!(report.agents["Ana"].get(AgentStatus::Available), 1800);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::anomaly::{detect_with, AlertRecord};
use crate::clock::{Clock, SystemClock};
use crate::config::AnalyticsConfig;
use crate::consolidation::consolidate;
use crate::error::Result;
use crate::filter::EventFilter;
use crate::model::{group_by_agent, ConsolidatedSegment, DashboardResponse, RawStateEvent, StateInterval};
use crate::summary::{
    agent_summary_with_threshold, fleet_metrics_with_threshold, status_distribution, summary_totals,
    AgentSummary, FleetMetrics, StatusShare, SummaryTotals,
};
use crate::timeline::{agent_timelines, time_labels, AgentTimeline};
use crate::trends::{hourly_activity, HourlyActivity};

/// Everything the supervisor dashboard shows for one day
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    pub generated_at: DateTime<Utc>,
    pub metrics: FleetMetrics,
    /// Per-agent totals, keyed by agent
    pub agents: BTreeMap<String, AgentSummary>,
    pub alerts: AlertRecord,
    pub timelines: Vec<AgentTimeline>,
    pub time_labels: Vec<String>,
    pub hourly: Vec<HourlyActivity>,
    /// Headline totals from the API-side summaries, when the response had any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<SummaryTotals>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub distribution: Vec<StatusShare>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Configured analytics pipeline
#[derive(Clone)]
pub struct StatusboardEngine {
    config: AnalyticsConfig,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for StatusboardEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusboardEngine")
            .field("config", &self.config)
            .field("now", &self.clock.now())
            .finish()
    }
}

impl StatusboardEngine {
    /// Create an engine after validating `config`
    pub fn new(config: AnalyticsConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, clock })
    }

    pub fn builder() -> StatusboardEngineBuilder {
        StatusboardEngineBuilder::new()
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Consolidate one agent's intervals with the configured threshold
    pub fn consolidate<E: StateInterval>(&self, events: &[E]) -> Vec<ConsolidatedSegment> {
        consolidate(events, self.threshold(), self.clock())
    }

    /// Totals for one agent's intervals
    pub fn agent_summary<E: StateInterval>(&self, events: &[E]) -> AgentSummary {
        agent_summary_with_threshold(events, self.threshold(), self.clock())
    }

    /// Totals for every agent, keyed by agent
    pub fn agent_summaries<E: StateInterval>(&self, events: &[E]) -> BTreeMap<String, AgentSummary> {
        group_by_agent(events)
            .into_iter()
            .map(|(agent, group)| (agent.to_string(), self.agent_summary(&group)))
            .collect()
    }

    pub fn fleet_metrics<E: StateInterval>(&self, events: &[E]) -> FleetMetrics {
        fleet_metrics_with_threshold(events, self.threshold(), self.clock())
    }

    pub fn detect<E: StateInterval>(&self, events: &[E]) -> AlertRecord {
        detect_with(events, &self.config.alerts, self.threshold(), self.clock())
    }

    pub fn timelines<E: StateInterval>(&self, events: &[E]) -> Vec<AgentTimeline> {
        agent_timelines(events, &self.config, self.clock())
    }

    pub fn hourly_activity<E: StateInterval>(&self, events: &[E]) -> Vec<HourlyActivity> {
        hourly_activity(events, self.clock())
    }

    /// Axis labels for the configured business window
    pub fn time_labels(&self) -> Vec<String> {
        let timeline = &self.config.timeline;
        time_labels(
            timeline.business_start_hour,
            timeline.business_end_hour,
            timeline.label_step_hours,
        )
    }

    /// Build the full report from canonical events
    pub fn report<E: StateInterval>(&self, events: &[E]) -> DashboardReport {
        info!("📊 Building dashboard report over {} intervals", events.len());

        DashboardReport {
            generated_at: self.clock.now(),
            metrics: self.fleet_metrics(events),
            agents: self.agent_summaries(events),
            alerts: self.detect(events),
            timelines: self.timelines(events),
            time_labels: self.time_labels(),
            hourly: self.hourly_activity(events),
            totals: None,
            distribution: Vec::new(),
            warning: None,
        }
    }

    /// Build the full report from a decoded API response
    ///
    /// `filter` narrows the intervals; the API-side summaries are used as
    /// they come.
    pub fn report_response(&self, response: &DashboardResponse, filter: &EventFilter) -> DashboardReport {
        let events: Vec<RawStateEvent> = filter.apply(&response.events());
        let mut report = self.report(&events);

        if !response.summary.is_empty() {
            report.totals = Some(summary_totals(&response.summary));
            report.distribution = status_distribution(&response.summary);
        }
        report.warning = response.warning.clone();

        info!(
            "✅ Report ready: {} agents, {} with alerts",
            report.agents.len(),
            report.alerts.len()
        );
        report
    }

    fn threshold(&self) -> u64 {
        self.config.consolidation.micro_event_threshold_secs
    }
}

/// Builder for [`StatusboardEngine`]
pub struct StatusboardEngineBuilder {
    config: Option<AnalyticsConfig>,
    clock: Option<Arc<dyn Clock>>,
}

impl StatusboardEngineBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            clock: None,
        }
    }

    pub fn with_config(mut self, config: AnalyticsConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use `clock` instead of the system clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the engine; defaults apply to anything not set
    pub fn build(self) -> Result<StatusboardEngine> {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        StatusboardEngine::new(self.config.unwrap_or_default(), clock)
    }
}

impl Default for StatusboardEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::StatusboardError;
    use crate::model::AgentStatus;
    use chrono::TimeZone;

    fn engine() -> StatusboardEngine {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap()));
        StatusboardEngine::builder().with_clock(clock).build().unwrap()
    }

    fn event(agent: &str, status: AgentStatus, start: &str, end: &str) -> RawStateEvent {
        let end = format!("2024-03-01T{end}");
        RawStateEvent::new(agent, status, format!("2024-03-01T{start}"), Some(end.as_str()))
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = StatusboardEngine::builder()
            .with_config(AnalyticsConfig::default().with_business_hours(10, 10))
            .build();
        assert!(matches!(result, Err(StatusboardError::Config(_))));
    }

    #[test]
    fn test_configured_threshold_is_used() {
        let events = vec![
            event("Ana", AgentStatus::Available, "09:00:00", "09:10:00"),
            event("Ana", AgentStatus::Busy, "09:10:00", "09:11:30"),
            event("Ana", AgentStatus::Available, "09:11:30", "09:20:00"),
        ];

        assert_eq!(engine().consolidate(&events).len(), 3);

        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap()));
        let lenient = StatusboardEngine::new(AnalyticsConfig::default().with_micro_event_threshold(120), clock)
            .unwrap();
        assert_eq!(lenient.consolidate(&events).len(), 1);
    }

    #[test]
    fn test_report_sections() {
        let events = vec![
            event("Ana", AgentStatus::Available, "09:00:00", "10:00:00"),
            event("Ana", AgentStatus::Offline, "10:00:00", "11:00:00"),
            event("Bo", AgentStatus::Busy, "09:00:00", "09:30:00"),
        ];

        let report = engine().report(&events);
        assert_eq!(report.metrics.agent_count, 2);
        assert_eq!(report.agents.len(), 2);
        assert_eq!(report.agents["Bo"].get(AgentStatus::Busy), 1800);
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.timelines.len(), 2);
        assert_eq!(report.time_labels.len(), 5);
        assert_eq!(report.hourly.len(), 24);
        assert!(report.totals.is_none());
        assert_eq!(
            report.generated_at,
            Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_report_response_applies_filter_and_summaries() {
        let body = r#"{
            "items": [
                {"AgentId": "a-1", "AgentName": "Ana", "Status": "Available",
                 "StartTime": "2024-03-01T09:00:00", "EndTime": "2024-03-01T10:00:00"},
                {"AgentId": "a-2", "AgentName": "Bo", "Status": "Busy",
                 "StartTime": "2024-03-01T09:00:00", "EndTime": "2024-03-01T09:30:00"}
            ],
            "summary": {
                "a-1": {"agentName": "Ana", "stateCounts": {"Available": 1},
                        "stateDurations": {"Available": "1h 0m 0s"}}
            },
            "warning": "Partial data"
        }"#;
        let response = DashboardResponse::from_json(body).unwrap();
        let filter = EventFilter::from_selectors(Some("Ana"), None).unwrap();

        let report = engine().report_response(&response, &filter);
        assert_eq!(report.agents.keys().collect::<Vec<_>>(), vec!["Ana"]);
        assert_eq!(report.totals.as_ref().map(|totals| totals.total_available), Some(3600));
        assert_eq!(report.distribution.len(), 1);
        assert_eq!(report.warning.as_deref(), Some("Partial data"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["metrics"]["availablePercentage"], 100);
        assert_eq!(json["agents"]["Ana"]["Available"], 3600);
    }
}
