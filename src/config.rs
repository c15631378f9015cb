//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "momentum-funnel")]
#[command(about = "A session-managed HTTP server for a sign-up funnel with a promotional countdown")]
#[command(version = "1.0.0")]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// JSON file holding the persisted funnel session
    #[arg(short, long, default_value = "momentum-data.json")]
    pub data_file: PathBuf,

    /// Keep the session in memory only (nothing survives a restart)
    #[arg(long)]
    pub ephemeral: bool,

    /// Discount window length in minutes
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u64).range(1..))]
    pub discount_minutes: u64,

    /// How often the countdown is re-evaluated, in milliseconds
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(10..))]
    pub tick_interval_ms: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Discount window length in milliseconds
    pub fn discount_duration_ms(&self) -> i64 {
        (self.discount_minutes as i64).saturating_mul(60 * 1000)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
