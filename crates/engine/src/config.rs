//! Analytics configuration
//!
//! Every knob of the pipeline lives here, grouped by the stage it affects:
//!
//! ```text
//! AnalyticsConfig
//!        │
//!        ├── ConsolidationConfig (micro-event threshold)
//!        ├── AlertConfig         (disconnect counts, offline and session limits)
//!        └── TimelineConfig      (business window, bar width, label spacing)
//! ```
//!
//! All fields have defaults, so a TOML file only needs the values it changes:
//!
//! ```rust
//! use statusboard_engine::config::AnalyticsConfig;
//!
//! let config = AnalyticsConfig::from_toml_str(
//!     r#"
//!     [timeline]
//!     business_start_hour = 8
//!     "#,
//! ).unwrap();
//!
//! assert_eq!(config.timeline.business_start_hour, 8);
//! assert_eq!(config.timeline.business_end_hour, 18);
//! assert_eq!(config.consolidation.micro_event_threshold_secs, 60);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, StatusboardError};

/// Top-level analytics configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub consolidation: ConsolidationConfig,
    pub alerts: AlertConfig,
    pub timeline: TimelineConfig,
}

/// State consolidation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// Interruptions shorter than this are absorbed into the surrounding run
    pub micro_event_threshold_secs: u64,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            micro_event_threshold_secs: 60,
        }
    }
}

/// Alert rule thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Raw disconnect count that raises a "frequent disconnects" alert
    pub frequent_disconnects: usize,

    /// Raw disconnect count that raises a "multiple disconnects" alert
    pub multiple_disconnects: usize,

    /// An Offline segment longer than this raises an alert
    pub long_offline_secs: u64,

    /// A multi-segment day shorter than this raises an alert
    pub short_session_secs: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            frequent_disconnects: 5,
            multiple_disconnects: 3,
            long_offline_secs: 1200, // 20 minutes
            short_session_secs: 300, // 5 minutes
        }
    }
}

/// Timeline rendering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// First local hour of the visible window
    pub business_start_hour: u32,

    /// Local hour the visible window ends at
    pub business_end_hour: u32,

    /// Narrowest bar, in percent of the window
    pub min_bar_width_percent: f64,

    /// Hours between axis labels
    pub label_step_hours: u32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            business_start_hour: 9,
            business_end_hour: 18,
            min_bar_width_percent: 1.0,
            label_step_hours: 2,
        }
    }
}

impl AnalyticsConfig {
    /// Parse a TOML document; missing sections and fields take defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: AnalyticsConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_micro_event_threshold(mut self, seconds: u64) -> Self {
        self.consolidation.micro_event_threshold_secs = seconds;
        self
    }

    pub fn with_business_hours(mut self, start_hour: u32, end_hour: u32) -> Self {
        self.timeline.business_start_hour = start_hour;
        self.timeline.business_end_hour = end_hour;
        self
    }

    pub fn with_alerts(mut self, alerts: AlertConfig) -> Self {
        self.alerts = alerts;
        self
    }

    /// Check cross-field consistency
    pub fn validate(&self) -> Result<()> {
        self.alerts.validate()?;
        self.timeline.validate()
    }
}

impl AlertConfig {
    pub fn validate(&self) -> Result<()> {
        if self.multiple_disconnects > self.frequent_disconnects {
            return Err(StatusboardError::config(format!(
                "multiple_disconnects ({}) must not exceed frequent_disconnects ({})",
                self.multiple_disconnects, self.frequent_disconnects
            )));
        }
        Ok(())
    }
}

impl TimelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.business_end_hour > 24 {
            return Err(StatusboardError::config(format!(
                "business_end_hour must be at most 24, got {}",
                self.business_end_hour
            )));
        }

        if self.business_start_hour >= self.business_end_hour {
            return Err(StatusboardError::config(format!(
                "business_start_hour ({}) must be before business_end_hour ({})",
                self.business_start_hour, self.business_end_hour
            )));
        }

        if self.label_step_hours == 0 {
            return Err(StatusboardError::config("label_step_hours must be greater than 0"));
        }

        if !(self.min_bar_width_percent > 0.0 && self.min_bar_width_percent <= 100.0) {
            return Err(StatusboardError::config(format!(
                "min_bar_width_percent must be within (0, 100], got {}",
                self.min_bar_width_percent
            )));
        }

        Ok(())
    }
}
