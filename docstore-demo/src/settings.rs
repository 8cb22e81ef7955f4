//! Settings for the walkthrough.
//!
//! Layered lowest to highest: built-in defaults, an optional TOML file,
//! `DOCSTORE_*` environment variables (a `.env` file is loaded into the
//! environment first), then command-line flags.

use crate::cli::Cli;
use crate::error::{DemoError, DemoResult};
use docstore_client::{ClientConfig, DEFAULT_URL, ProtocolVersion};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

/// Collection the scenario uses unless told otherwise.
pub const DEFAULT_COLLECTION: &str = "twitter";

/// Resolved walkthrough settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Endpoints, tried in order.
    pub urls: Vec<String>,
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// Collection the scenario recreates.
    pub collection: String,
    /// Whether to handshake before picking an endpoint.
    pub healthcheck: bool,
    /// Handshake timeout.
    pub connect_timeout: Duration,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Store version assumed when the handshake is skipped.
    pub assume_version: Option<ProtocolVersion>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            urls: vec![DEFAULT_URL.to_string()],
            username: None,
            password: None,
            collection: DEFAULT_COLLECTION.to_string(),
            healthcheck: true,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            assume_version: None,
        }
    }
}

/// Settings file contents; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSettings {
    /// Endpoints.
    pub urls: Option<Vec<String>>,
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// Collection name.
    pub collection: Option<String>,
    /// Handshake toggle.
    pub healthcheck: Option<bool>,
    /// Handshake timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Version assumed without a handshake, e.g. `1.7.5` or `opensearch 2.11.0`.
    pub assume_version: Option<String>,
}

impl FileSettings {
    /// Read and parse a TOML settings file.
    pub fn read(path: &Path) -> DemoResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| DemoError::SettingsIo {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| DemoError::SettingsParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Settings {
    /// Resolve settings for a run: defaults, file, environment, flags.
    pub fn load(cli: &Cli) -> DemoResult<Self> {
        let mut settings = Settings::default();
        if let Some(path) = &cli.config {
            settings.apply_file(FileSettings::read(path)?)?;
        }
        settings.apply_env(|key| env::var(key).ok())?;
        settings.apply_cli(cli);
        settings.validate()?;
        Ok(settings)
    }

    /// Overlay values present in a settings file.
    pub fn apply_file(&mut self, file: FileSettings) -> DemoResult<()> {
        if let Some(urls) = file.urls {
            self.urls = urls;
        }
        if file.username.is_some() {
            self.username = file.username;
        }
        if file.password.is_some() {
            self.password = file.password;
        }
        if let Some(collection) = file.collection {
            self.collection = collection;
        }
        if let Some(healthcheck) = file.healthcheck {
            self.healthcheck = healthcheck;
        }
        if let Some(secs) = file.connect_timeout_secs {
            self.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(version) = file.assume_version {
            self.assume_version = Some(parse_version("assume_version", &version)?);
        }
        Ok(())
    }

    /// Overlay `DOCSTORE_*` variables found through `lookup`.
    ///
    /// `DOCSTORE_URL` takes a comma-separated list.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> DemoResult<()> {
        if let Some(urls) = lookup("DOCSTORE_URL") {
            self.urls = urls
                .split(',')
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(username) = lookup("DOCSTORE_USERNAME") {
            self.username = Some(username);
        }
        if let Some(password) = lookup("DOCSTORE_PASSWORD") {
            self.password = Some(password);
        }
        if let Some(collection) = lookup("DOCSTORE_COLLECTION") {
            self.collection = collection;
        }
        if let Some(flag) = lookup("DOCSTORE_HEALTHCHECK") {
            self.healthcheck = parse_flag(&flag).ok_or_else(|| {
                DemoError::validation("DOCSTORE_HEALTHCHECK", format!("not a boolean: {flag:?}"))
            })?;
        }
        if let Some(version) = lookup("DOCSTORE_ASSUME_VERSION") {
            self.assume_version = Some(parse_version("DOCSTORE_ASSUME_VERSION", &version)?);
        }
        Ok(())
    }

    /// Overlay command-line flags.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if !cli.urls.is_empty() {
            self.urls = cli.urls.clone();
        }
        if cli.username.is_some() {
            self.username = cli.username.clone();
        }
        if cli.password.is_some() {
            self.password = cli.password.clone();
        }
        if let Some(collection) = &cli.collection {
            self.collection = collection.clone();
        }
        if cli.no_healthcheck {
            self.healthcheck = false;
        }
    }

    /// Reject settings the client cannot work with.
    pub fn validate(&self) -> DemoResult<()> {
        if self.urls.is_empty() {
            return Err(DemoError::validation("urls", "at least one endpoint is required"));
        }
        for url in &self.urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(DemoError::validation(
                    "urls",
                    format!("{url:?} is not an http(s) URL"),
                ));
            }
        }
        if self.collection.trim().is_empty() {
            return Err(DemoError::validation("collection", "cannot be empty"));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(DemoError::validation("password", "given without a username"));
        }
        Ok(())
    }

    /// Client configuration for these settings.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::cluster(self.urls.clone())
            .with_connect_timeout(self.connect_timeout)
            .with_request_timeout(self.request_timeout)
            .with_healthcheck(self.healthcheck);
        if let Some(version) = self.assume_version {
            config = config.with_assumed_version(version);
        }
        if let Some(username) = &self.username {
            config = config.with_basic_auth(username, self.password.as_deref().unwrap_or_default());
        }
        config
    }
}

fn parse_version(field: &'static str, value: &str) -> DemoResult<ProtocolVersion> {
    value
        .parse()
        .map_err(|message: String| DemoError::validation(field, message))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
