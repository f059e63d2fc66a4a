//! `statusboard` - inspect agent presence analytics from a saved dashboard
//! API response.
//!
//! ```text
//! statusboard report   --input response.json
//! statusboard timeline --input response.json --agent "Ana" --granular
//! statusboard alerts   --input response.json --now 2024-03-01T18:00:00+01:00 --json
//! ```

mod logging;
mod output;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Offset, Utc};
use colored::Colorize;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info, Level};

use logging::{LogFormat, LogOptions};
use statusboard_engine::{
    AnalyticsConfig, Clock, DashboardResponse, EventFilter, ManualClock, RawStateEvent, StatusboardEngine,
    SystemClock,
};

#[derive(Parser, Debug)]
#[command(name = "statusboard", version, about = "Agent presence analytics for call-center supervisors")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG adds per-target directives
    #[arg(long, global = true, env = "STATUSBOARD_LOG_LEVEL", default_value = "warn")]
    log_level: Level,

    /// Log line format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Include source file and line in log lines
    #[arg(long, global = true)]
    log_source: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fleet KPIs, per-agent totals and alerts
    Report(InputArgs),

    /// Per-agent time in each status
    Summary(InputArgs),

    /// Unusual behaviour per agent
    Alerts(InputArgs),

    /// Business-hours timeline per agent
    Timeline {
        #[command(flatten)]
        input: InputArgs,

        /// Show same-status merging only, without absorbing brief interruptions
        #[arg(long)]
        granular: bool,
    },

    /// Status counts per hour of the day
    Trends(InputArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Saved dashboard API response (`-` reads stdin)
    #[arg(short, long, env = "STATUSBOARD_INPUT")]
    input: PathBuf,

    /// Analytics configuration (TOML)
    #[arg(short, long, env = "STATUSBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Agent to show, or `all`
    #[arg(long, default_value = "all")]
    agent: String,

    /// Status, comma-separated statuses, or `all`
    #[arg(long, default_value = "all")]
    status: String,

    /// Measure live sessions up to this RFC 3339 instant instead of now;
    /// its offset is also used as the local timezone
    #[arg(long)]
    now: Option<String>,
}

/// Everything a command needs, loaded from the input arguments
struct Session {
    engine: StatusboardEngine,
    response: DashboardResponse,
    filter: EventFilter,
}

impl Session {
    fn load(args: &InputArgs) -> Result<Self> {
        let config = match &args.config {
            Some(path) => {
                let source = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                AnalyticsConfig::from_toml_str(&source)
                    .with_context(|| format!("Invalid config file {}", path.display()))?
            }
            None => AnalyticsConfig::default(),
        };

        let clock: Arc<dyn Clock> = match &args.now {
            Some(now) => {
                let instant = DateTime::parse_from_rfc3339(now)
                    .with_context(|| format!("--now must be an RFC 3339 timestamp, got '{}'", now))?;
                Arc::new(ManualClock::with_offset(instant.with_timezone(&Utc), instant.offset().fix()))
            }
            None => Arc::new(SystemClock),
        };

        let engine = StatusboardEngine::new(config, clock)?;
        debug!("Engine ready: {:?}", engine);

        let body = read_input(&args.input)?;
        let response = DashboardResponse::from_json(&body)
            .with_context(|| format!("Failed to decode dashboard response {}", args.input.display()))?;
        info!("Loaded {} state records", response.items.len());

        let filter = EventFilter::from_selectors(Some(args.agent.as_str()), Some(args.status.as_str()))?;

        Ok(Self {
            engine,
            response,
            filter,
        })
    }

    fn events(&self) -> Vec<RawStateEvent> {
        self.filter.apply(&self.response.events())
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut body = String::new();
        io::stdin()
            .read_to_string(&mut body)
            .context("Failed to read dashboard response from stdin")?;
        return Ok(body);
    }

    fs::read_to_string(path).with_context(|| format!("Failed to read dashboard response {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogOptions {
        level: cli.log_level,
        format: cli.log_format,
        source_locations: cli.log_source,
    })?;
    info!("Starting statusboard v{}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Command::Report(args) => report(args, cli.json),
        Command::Summary(args) => summary(args, cli.json),
        Command::Alerts(args) => alerts(args, cli.json),
        Command::Timeline { input, granular } => timeline(input, *granular, cli.json),
        Command::Trends(args) => trends(args, cli.json),
    }
}

fn report(args: &InputArgs, json: bool) -> Result<()> {
    let session = Session::load(args)?;
    let report = session.engine.report_response(&session.response, &session.filter);

    if json {
        return output::print_json(&report);
    }

    if let Some(warning) = &report.warning {
        println!("{} {}\n", "warning:".yellow().bold(), warning);
    }
    println!("{}", output::render_metrics(&report.metrics));
    if let Some(totals) = &report.totals {
        println!("{}", output::render_totals(totals, &report.distribution));
    }
    println!("{}\n", output::render_agent_table(&report.agents));
    println!("{}", output::render_alerts(&report.alerts));
    Ok(())
}

fn summary(args: &InputArgs, json: bool) -> Result<()> {
    let session = Session::load(args)?;
    let events = session.events();
    let agents = session.engine.agent_summaries(&events);
    let metrics = session.engine.fleet_metrics(&events);

    if json {
        return output::print_json(&serde_json::json!({
            "metrics": metrics,
            "agents": agents,
        }));
    }

    println!("{}", output::render_metrics(&metrics));
    println!("{}", output::render_agent_table(&agents));
    Ok(())
}

fn alerts(args: &InputArgs, json: bool) -> Result<()> {
    let session = Session::load(args)?;
    let alerts = session.engine.detect(&session.events());

    if json {
        return output::print_json(&alerts);
    }
    println!("{}", output::render_alerts(&alerts));
    Ok(())
}

fn timeline(args: &InputArgs, granular: bool, json: bool) -> Result<()> {
    let session = Session::load(args)?;
    let timelines = session.engine.timelines(&session.events());

    if json {
        return output::print_json(&timelines);
    }
    println!(
        "{}",
        output::render_timelines(&timelines, &session.engine.time_labels(), granular)
    );
    Ok(())
}

fn trends(args: &InputArgs, json: bool) -> Result<()> {
    let session = Session::load(args)?;
    let hours = session.engine.hourly_activity(&session.events());

    if json {
        return output::print_json(&hours);
    }
    println!("{}", output::render_trends(&hours));
    Ok(())
}
