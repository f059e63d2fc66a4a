//! Terminal rendering for reports

use std::collections::BTreeMap;
use std::fmt::Write as _;

use anyhow::Result;
use colored::{ColoredString, Colorize};
use serde::Serialize;
use statusboard_engine::time::format_duration;
use statusboard_engine::{
    AgentStatus, AgentSummary, AgentTimeline, AlertRecord, FleetMetrics, HourlyActivity, StatusShare, SummaryTotals,
    TimelineBar,
};
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Columns used to draw one timeline row
pub const TIMELINE_COLUMNS: usize = 72;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn paint(status: AgentStatus, text: &str) -> ColoredString {
    match status {
        AgentStatus::Available => text.green(),
        AgentStatus::Busy => text.red(),
        AgentStatus::Offline => text.dimmed(),
        AgentStatus::Disconnect => text.yellow(),
    }
}

fn glyph(status: AgentStatus) -> &'static str {
    match status {
        AgentStatus::Available => "█",
        AgentStatus::Busy => "▓",
        AgentStatus::Offline => "░",
        AgentStatus::Disconnect => "▒",
    }
}

/// KPI cards
pub fn render_metrics(metrics: &FleetMetrics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Fleet overview".bold());
    let _ = writeln!(out, "  Agents tracked:        {}", metrics.agent_count);
    let _ = writeln!(
        out,
        "  Time available:        {}",
        format!("{}%", metrics.available_percentage).green()
    );
    let _ = writeln!(out, "  Time busy:             {}", format!("{}%", metrics.busy_percentage).red());
    let _ = writeln!(
        out,
        "  Time offline:          {} ({}% disconnected)",
        format!("{}%", metrics.offline_percentage).dimmed(),
        metrics.disconnect_percentage
    );
    let _ = writeln!(
        out,
        "  Disconnections:        {}",
        format!("{}", metrics.total_disconnections).yellow()
    );
    let _ = writeln!(
        out,
        "  Longest available run: {}",
        format_duration(metrics.longest_continuous_available)
    );
    let _ = writeln!(out, "  Total tracked:         {}", format_duration(metrics.total_duration));
    out
}

/// Headline totals reported by the API itself
pub fn render_totals(totals: &SummaryTotals, distribution: &[StatusShare]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Reported totals".bold());
    let _ = writeln!(
        out,
        "  Available {} ({}%), busy {}, offline {} across {} agents",
        format_duration(totals.total_available),
        totals.available_percentage,
        format_duration(totals.total_busy),
        format_duration(totals.total_offline),
        totals.agent_count
    );
    let _ = writeln!(
        out,
        "  Per agent: {} available, {} offline",
        format_duration(totals.avg_available.round() as u64),
        format_duration(totals.avg_offline.round() as u64)
    );
    for share in distribution {
        let _ = writeln!(
            out,
            "  {:<10} {:>6} min",
            paint(share.status, share.status.as_str()),
            share.minutes
        );
    }
    out
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Agent")]
    agent: String,
    #[tabled(rename = "Available")]
    available: String,
    #[tabled(rename = "Busy")]
    busy: String,
    #[tabled(rename = "Offline")]
    offline: String,
    #[tabled(rename = "Disconnect")]
    disconnect: String,
    #[tabled(rename = "Total")]
    total: String,
}

/// Per-agent time-in-status table
pub fn render_agent_table(agents: &BTreeMap<String, AgentSummary>) -> String {
    if agents.is_empty() {
        return "No agent activity".dimmed().to_string();
    }

    let rows = agents.iter().map(|(agent, summary)| SummaryRow {
        agent: agent.clone(),
        available: format_duration(summary.get(AgentStatus::Available)),
        busy: format_duration(summary.get(AgentStatus::Busy)),
        offline: format_duration(summary.get(AgentStatus::Offline)),
        disconnect: format_duration(summary.get(AgentStatus::Disconnect)),
        total: format_duration(summary.total()),
    });

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Alert list, one line per alert
pub fn render_alerts(alerts: &AlertRecord) -> String {
    if alerts.is_empty() {
        return format!("{} No unusual behaviour detected", "✓".green());
    }

    let mut out = String::new();
    for (agent, agent_alerts) in alerts.iter() {
        for alert in agent_alerts {
            let _ = writeln!(out, "{} {}: {}", "⚠".yellow(), agent.bold(), alert);
        }
    }
    out
}

/// Which status occupies each column of a timeline row
///
/// Later bars overwrite earlier ones; every bar claims at least one column.
pub fn timeline_cells(bars: &[TimelineBar], columns: usize) -> Vec<Option<AgentStatus>> {
    let mut cells = vec![None; columns];
    if columns == 0 {
        return cells;
    }

    for bar in bars {
        let first = ((bar.left / 100.0) * columns as f64).floor() as usize;
        let span = ((bar.width / 100.0) * columns as f64).round().max(1.0) as usize;
        let first = first.min(columns - 1);
        let last = (first + span).min(columns);
        for cell in &mut cells[first..last] {
            *cell = Some(bar.status);
        }
    }
    cells
}

/// Text timeline, one row per agent
pub fn render_timelines(timelines: &[AgentTimeline], labels: &[String], granular: bool) -> String {
    let mut out = String::new();
    let name_width = timelines
        .iter()
        .map(|timeline| timeline.agent.chars().count())
        .max()
        .unwrap_or(0)
        .max(5);

    let _ = writeln!(out, "{:name_width$}  {}", "", axis(labels, TIMELINE_COLUMNS));

    for timeline in timelines {
        let bars = if granular {
            &timeline.raw_segments
        } else {
            &timeline.segments
        };

        let mut row = String::new();
        for cell in timeline_cells(bars, TIMELINE_COLUMNS) {
            match cell {
                Some(status) => {
                    let _ = write!(row, "{}", paint(status, glyph(status)));
                }
                None => row.push(' '),
            }
        }

        let live = if bars.iter().any(|bar| bar.is_live) {
            format!(" {}", "● live".green())
        } else {
            String::new()
        };
        let _ = writeln!(out, "{:name_width$}  {}{}", timeline.agent, row, live);

        for alert in &timeline.alerts {
            let _ = writeln!(out, "{:name_width$}  {} {}", "", "⚠".yellow(), alert);
        }
    }

    let legend = AgentStatus::ALL
        .iter()
        .map(|status| format!("{} {}", paint(*status, glyph(*status)), status))
        .collect::<Vec<_>>()
        .join("  ");
    let _ = writeln!(out, "\n{}", legend);
    out
}

fn axis(labels: &[String], columns: usize) -> String {
    let mut line = vec![' '; columns];
    let count = labels.len();
    for (i, label) in labels.iter().enumerate() {
        let position = if count > 1 { i * columns / count } else { 0 };
        for (offset, ch) in label.chars().enumerate() {
            if let Some(slot) = line.get_mut(position + offset) {
                *slot = ch;
            }
        }
    }
    line.into_iter().collect::<String>().trim_end().to_string()
}

#[derive(Tabled)]
struct TrendRow {
    #[tabled(rename = "Hour")]
    hour: String,
    #[tabled(rename = "Available")]
    available: u32,
    #[tabled(rename = "Busy")]
    busy: u32,
    #[tabled(rename = "Offline")]
    offline: u32,
    #[tabled(rename = "Disconnect")]
    disconnect: u32,
}

/// Hourly activity table; hours with no activity are skipped
pub fn render_trends(hours: &[HourlyActivity]) -> String {
    let rows: Vec<TrendRow> = hours
        .iter()
        .filter(|hour| hour.total() > 0)
        .map(|hour| TrendRow {
            hour: hour.label.clone(),
            available: hour.available,
            busy: hour.busy,
            offline: hour.offline,
            disconnect: hour.disconnect,
        })
        .collect();

    if rows.is_empty() {
        return "No activity recorded".dimmed().to_string();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(status: AgentStatus, left: f64, width: f64) -> TimelineBar {
        TimelineBar {
            status,
            left,
            width,
            is_live: false,
            start_time: String::new(),
            end_time: None,
            duration: 0,
        }
    }

    #[test]
    fn test_timeline_cells() {
        let cells = timeline_cells(
            &[
                bar(AgentStatus::Available, 0.0, 50.0),
                bar(AgentStatus::Busy, 50.0, 10.0),
                bar(AgentStatus::Disconnect, 99.5, 1.0),
            ],
            10,
        );
        assert_eq!(cells[0], Some(AgentStatus::Available));
        assert_eq!(cells[4], Some(AgentStatus::Available));
        assert_eq!(cells[5], Some(AgentStatus::Busy));
        assert_eq!(cells[6], None);
        assert_eq!(cells[9], Some(AgentStatus::Disconnect));
        assert!(timeline_cells(&[], 0).is_empty());
    }

    #[test]
    fn test_axis_places_labels() {
        let labels = vec!["09:00".to_string(), "11:00".to_string()];
        let line = axis(&labels, 20);
        assert!(line.starts_with("09:00"));
        assert_eq!(&line[10..15], "11:00");
    }

    #[test]
    fn test_agent_table_lists_agents() {
        let mut agents = BTreeMap::new();
        let mut summary = AgentSummary::new();
        summary.add(AgentStatus::Busy, 135);
        agents.insert("Ana".to_string(), summary);

        let table = render_agent_table(&agents);
        assert!(table.contains("Ana"));
        assert!(table.contains("2m 15s"));
        assert!(table.contains("Disconnect"));
    }

    #[test]
    fn test_trends_skip_idle_hours() {
        let idle = HourlyActivity {
            hour: 3,
            label: "03:00".to_string(),
            ..Default::default()
        };
        let busy = HourlyActivity {
            hour: 9,
            label: "09:00".to_string(),
            busy: 2,
            ..Default::default()
        };
        let table = render_trends(&[idle, busy]);
        assert!(table.contains("09:00"));
        assert!(!table.contains("03:00"));
    }
}
