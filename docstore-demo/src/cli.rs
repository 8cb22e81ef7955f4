//! Command-line interface of `hello-docstore`.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Walk a document store through the twitter hello-world scenario
#[derive(Debug, Parser)]
#[command(name = "hello-docstore")]
#[command(author = "Pegasus Heavy Industries LLC")]
#[command(version)]
#[command(about = "Walk a document store through the twitter hello-world scenario")]
#[command(long_about = None)]
pub struct Cli {
    /// Store endpoint; repeat to list fallbacks tried in order
    #[arg(short, long = "url", value_name = "URL")]
    pub urls: Vec<String>,

    /// TOML settings file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Basic auth username
    #[arg(long)]
    pub username: Option<String>,

    /// Basic auth password
    #[arg(long)]
    pub password: Option<String>,

    /// Collection the scenario recreates
    #[arg(long)]
    pub collection: Option<String>,

    /// Skip the liveness handshake on connect
    #[arg(long)]
    pub no_healthcheck: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Multi-line, human-oriented
    Pretty,
    /// Single line per event
    Compact,
    /// One JSON object per event
    Json,
}

impl From<LogFormat> for docstore_log::Format {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Pretty => docstore_log::Format::Pretty,
            LogFormat::Compact => docstore_log::Format::Compact,
            LogFormat::Json => docstore_log::Format::Json,
        }
    }
}

impl Cli {
    /// Logging configuration: environment first, then flags.
    pub fn log_config(&self) -> docstore_log::LogConfig {
        let mut config = docstore_log::LogConfig::from_env();
        if self.verbose {
            config = config.with_level(docstore_log::Level::Debug);
        }
        if let Some(format) = self.log_format {
            config = config.with_format(format.into());
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_urls() {
        let cli = Cli::try_parse_from([
            "hello-docstore",
            "--url",
            "http://a:9200",
            "-u",
            "http://b:9200",
            "--no-healthcheck",
        ])
        .unwrap();

        assert_eq!(cli.urls, vec!["http://a:9200", "http://b:9200"]);
        assert!(cli.no_healthcheck);
        assert!(cli.collection.is_none());
    }

    #[test]
    fn test_log_flags() {
        let cli =
            Cli::try_parse_from(["hello-docstore", "-v", "--log-format", "json"]).unwrap();
        let config = cli.log_config();

        assert_eq!(config.level, docstore_log::Level::Debug);
        assert_eq!(config.format, docstore_log::Format::Json);
        assert!(!config.color);
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["hello-docstore", "--log-format", "xml"]).is_err());
    }
}
