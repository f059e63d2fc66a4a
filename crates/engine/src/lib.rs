//! # Statusboard Engine
//!
//! Agent presence consolidation and analytics for call-center supervisor
//! dashboards. Takes the flat list of presence intervals a dashboard API
//! returns for one day and turns it into what a supervisor actually reads:
//!
//! - a cleaned timeline per agent, with brief interruptions absorbed,
//! - per-agent and fleet-wide time-in-status summaries,
//! - rule-based alerts (frequent disconnects, long offline stretches),
//! - business-hours timeline bars and hourly activity buckets.
//!
//! ## Pipeline
//!
//! ```text
//! API JSON ──► model (ingestion) ──► consolidation ──┬──► summary
//!                                                    ├──► anomaly
//!                                                    ├──► timeline
//!                                                    └──► trends
//! ```
//!
//! Every operation is synchronous and pure over its inputs plus an injected
//! [`clock::Clock`]. Live sessions (no end time) are measured against that
//! clock, so a caller refreshing a live view simply re-runs the pipeline.
//!
//! ## Quick Start
//!
//! ```rust
//! use statusboard_engine::prelude::*;
//! use chrono::{TimeZone, Utc};
//!
//! let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap());
//! let events = vec![
//!     RawStateEvent::new("Ana", AgentStatus::Available, "2024-03-01T09:00:00", Some("2024-03-01T09:10:00")),
//!     RawStateEvent::new("Ana", AgentStatus::Disconnect, "2024-03-01T09:10:00", Some("2024-03-01T09:10:30")),
//!     RawStateEvent::new("Ana", AgentStatus::Available, "2024-03-01T09:10:30", Some("2024-03-01T09:20:00")),
//! ];
//!
//! let segments = consolidate(&events, 60, &clock);
//! assert_eq!(segments.len(), 1);
//! assert_eq!(segments[0].duration, 1200);
//! ```

pub mod anomaly;
pub mod clock;
pub mod config;
pub mod consolidation;
pub mod engine;
pub mod error;
pub mod filter;
pub mod model;
pub mod summary;
pub mod time;
pub mod timeline;
pub mod trends;

pub use anomaly::{detect, detect_with, Alert, AlertRecord};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AlertConfig, AnalyticsConfig, ConsolidationConfig, TimelineConfig};
pub use consolidation::{consolidate, consolidate_by_agent, DEFAULT_MICRO_EVENT_THRESHOLD_SECS};
pub use engine::{DashboardReport, StatusboardEngine, StatusboardEngineBuilder};
pub use error::{Result, StatusboardError};
pub use filter::{agent_names, EventFilter};
pub use model::{
    AgentStatus, ApiAgentSummary, ConsolidatedSegment, DashboardResponse, DurationValue, RawStateEvent,
    StateInterval, StateRecord,
};
pub use summary::{
    agent_summary, fleet_metrics, status_distribution, summary_totals, AgentSummary, FleetMetrics,
    StatusShare, SummaryTotals,
};
pub use timeline::{agent_timelines, project, time_labels, AgentTimeline, TimelineBar};
pub use trends::{hourly_activity, HourlyActivity};

/// Commonly used types and operations
pub mod prelude {
    pub use crate::{
        agent_summary, consolidate, detect, fleet_metrics, hourly_activity, project,
        AgentStatus, AgentSummary, Alert, AlertRecord, AnalyticsConfig, Clock, ConsolidatedSegment,
        DashboardReport, DashboardResponse, EventFilter, FleetMetrics, ManualClock, RawStateEvent,
        StateInterval, StatusboardEngine, StatusboardError, SystemClock, TimelineBar,
    };
}
