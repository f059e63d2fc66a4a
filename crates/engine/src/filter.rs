//! Agent and status selection
//!
//! Mirrors the dashboard's two drop-downs: one agent or `all`, and one status,
//! a comma-separated list of statuses, or `all`.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::model::{AgentStatus, StateInterval};

const ALL: &str = "all";

/// Selection applied to a list of intervals before analysis
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Agent key to keep; `None` keeps every agent
    pub agent: Option<String>,
    /// Statuses to keep; `None` keeps every status
    pub statuses: Option<BTreeSet<AgentStatus>>,
}

impl EventFilter {
    /// Filter that keeps everything
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a filter from the raw selector values
    ///
    /// `all` (any case) and blank selectors disable that half of the filter,
    /// as does a status list with no names in it (`","`). An unknown status
    /// name is an error.
    pub fn from_selectors(agent: Option<&str>, status: Option<&str>) -> Result<Self> {
        let agent = agent
            .map(str::trim)
            .filter(|agent| !is_wildcard(agent))
            .map(str::to_string);

        let statuses = match status.map(str::trim).filter(|status| !is_wildcard(status)) {
            Some(list) => Some(
                list.split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(str::parse::<AgentStatus>)
                    .collect::<Result<BTreeSet<_>>>()?,
            )
            .filter(|statuses| !statuses.is_empty()),
            None => None,
        };

        Ok(Self { agent, statuses })
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.statuses.get_or_insert_with(BTreeSet::new).insert(status);
        self
    }

    /// True when `event` passes both halves of the filter
    pub fn matches<E: StateInterval>(&self, event: &E) -> bool {
        let agent_ok = self
            .agent
            .as_deref()
            .is_none_or(|agent| event.agent_key() == agent);
        let status_ok = self
            .statuses
            .as_ref()
            .is_none_or(|statuses| statuses.contains(&event.status()));
        agent_ok && status_ok
    }

    /// Copies of the matching intervals, in input order
    pub fn apply<E: StateInterval + Clone>(&self, events: &[E]) -> Vec<E> {
        events.iter().filter(|event| self.matches(*event)).cloned().collect()
    }
}

fn is_wildcard(selector: &str) -> bool {
    selector.is_empty() || selector.eq_ignore_ascii_case(ALL)
}

/// Sorted, de-duplicated agent keys
pub fn agent_names<E: StateInterval>(events: &[E]) -> Vec<String> {
    events
        .iter()
        .map(|event| event.agent_key().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatusboardError;
    use crate::model::RawStateEvent;

    fn events() -> Vec<RawStateEvent> {
        vec![
            RawStateEvent::new("Bo", AgentStatus::Busy, "2024-03-01T09:00:00", None),
            RawStateEvent::new("Ana", AgentStatus::Available, "2024-03-01T09:00:00", None),
            RawStateEvent::new("Ana", AgentStatus::Disconnect, "2024-03-01T09:10:00", None),
            RawStateEvent::new("Bo", AgentStatus::Offline, "2024-03-01T09:20:00", None),
        ]
    }

    #[test]
    fn test_wildcards_keep_everything() {
        let filter = EventFilter::from_selectors(Some("all"), Some("ALL")).unwrap();
        assert_eq!(filter, EventFilter::all());
        assert_eq!(filter.apply(&events()).len(), 4);
        assert_eq!(EventFilter::from_selectors(None, Some("")).unwrap(), EventFilter::all());
    }

    #[test]
    fn test_status_list_without_names_keeps_everything() {
        for selector in [",", " , ,", ",,"] {
            let filter = EventFilter::from_selectors(None, Some(selector)).unwrap();
            assert_eq!(filter.statuses, None);
            assert_eq!(filter.apply(&events()).len(), 4);
        }
    }

    #[test]
    fn test_agent_selector() {
        let filter = EventFilter::from_selectors(Some("Ana"), None).unwrap();
        let kept = filter.apply(&events());
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|event| event.agent_name == "Ana"));
    }

    #[test]
    fn test_status_list_selector() {
        let filter = EventFilter::from_selectors(None, Some("Busy, Disconnected")).unwrap();
        let kept = filter.apply(&events());
        assert_eq!(
            kept.iter().map(|event| event.status).collect::<Vec<_>>(),
            vec![AgentStatus::Busy, AgentStatus::Disconnect]
        );
    }

    #[test]
    fn test_combined_selectors() {
        let filter = EventFilter::all().with_agent("Bo").with_status(AgentStatus::Offline);
        let kept = filter.apply(&events());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].start_time, "2024-03-01T09:20:00");
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!(matches!(
            EventFilter::from_selectors(None, Some("Busy,Lunch")),
            Err(StatusboardError::InvalidStatus(_))
        ));
    }

    #[test]
    fn test_agent_names() {
        assert_eq!(agent_names(&events()), vec!["Ana".to_string(), "Bo".to_string()]);
        assert!(agent_names::<RawStateEvent>(&[]).is_empty());
    }
}
