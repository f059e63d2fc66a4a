//! Log subscriber for the `statusboard` binary
//!
//! Everything goes to stderr so report output on stdout stays pipeable.

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Shape of each log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging switches collected from the command line
#[derive(Debug, Clone)]
pub struct LogOptions {
    pub level: Level,
    pub format: LogFormat,
    /// Tag lines with source file and line number
    pub source_locations: bool,
}

impl LogOptions {
    /// `RUST_LOG` directives apply on top of the command-line level
    fn filter(&self) -> EnvFilter {
        EnvFilter::builder()
            .with_default_directive(self.level.into())
            .from_env_lossy()
    }
}

/// Install the global subscriber; fails if one is already set
pub fn init(options: &LogOptions) -> Result<()> {
    let builder = fmt::Subscriber::builder()
        .with_env_filter(options.filter())
        .with_writer(std::io::stderr)
        .with_file(options.source_locations)
        .with_line_number(options.source_locations);

    let installed = match options.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| anyhow!("Failed to install log subscriber: {}", e))?;

    tracing::debug!("Logging at {} as {:?}", options.level, options.format);
    Ok(())
}
