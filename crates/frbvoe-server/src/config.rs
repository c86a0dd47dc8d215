//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Transient Name Server settings.
    #[serde(default)]
    pub tns: TnsConfig,

    /// VOEvent broker settings.
    #[serde(default)]
    pub broker: BrokerConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "frbvoe_tns=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Transient Name Server credentials and polling policy.
#[derive(Debug, Clone, Deserialize)]
pub struct TnsConfig {
    /// TNS User Group API key. Keep it out of version control.
    #[serde(default)]
    pub api_key: String,

    /// Numeric id of the group's TNS API bot.
    #[serde(default)]
    pub bot_id: String,

    /// Display name of the group's TNS API bot.
    #[serde(default)]
    pub bot_name: String,

    /// Submit to the TNS sandbox instead of the live system.
    #[serde(default = "default_true")]
    pub sandbox: bool,

    /// Seconds to wait between result polls after a submission.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Number of result polls before giving up waiting for a name.
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,

    /// Overrides the sandbox/live selection with an arbitrary endpoint.
    /// Intended for integration tests against a local mock.
    #[serde(default)]
    pub url: Option<String>,
}

/// VOEvent broker settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Endpoint of the broker. Broker push is disabled when unset.
    #[serde(default)]
    pub url: Option<String>,

    /// Stream tag attached to every published event.
    #[serde(default = "default_stream")]
    pub stream: String,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8002
}

fn default_db_path() -> String {
    "frbvoe.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_poll_attempts() -> u32 {
    2
}

fn default_stream() -> String {
    "frb-voe".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for TnsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            bot_id: String::new(),
            bot_name: String::new(),
            sandbox: true,
            poll_interval_secs: default_poll_interval_secs(),
            poll_attempts: default_poll_attempts(),
            url: None,
        }
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: None,
            stream: default_stream(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `FRBVOE_HOST` overrides `server.host`
/// - `FRBVOE_PORT` overrides `server.port`
/// - `FRBVOE_DB_PATH` overrides `database.path`
/// - `FRBVOE_LOG_LEVEL` overrides `logging.level`
/// - `FRBVOE_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `FRBVOE_TNS_API_KEY` overrides `tns.api_key`
/// - `FRBVOE_TNS_BOT_ID` overrides `tns.bot_id`
/// - `FRBVOE_TNS_BOT_NAME` overrides `tns.bot_name`
/// - `FRBVOE_TNS_SANDBOX` overrides `tns.sandbox` (set to "false" for live)
/// - `FRBVOE_BROKER_URL` overrides `broker.url`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("FRBVOE_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("FRBVOE_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(db_path) = std::env::var("FRBVOE_DB_PATH") {
        config.database.path = db_path;
    }
    if let Ok(level) = std::env::var("FRBVOE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("FRBVOE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Ok(api_key) = std::env::var("FRBVOE_TNS_API_KEY") {
        config.tns.api_key = api_key;
    }
    if let Ok(bot_id) = std::env::var("FRBVOE_TNS_BOT_ID") {
        config.tns.bot_id = bot_id;
    }
    if let Ok(bot_name) = std::env::var("FRBVOE_TNS_BOT_NAME") {
        config.tns.bot_name = bot_name;
    }
    if let Ok(sandbox) = std::env::var("FRBVOE_TNS_SANDBOX") {
        config.tns.sandbox = !(sandbox == "false" || sandbox == "0");
    }
    if let Ok(url) = std::env::var("FRBVOE_BROKER_URL") {
        config.broker.url = Some(url);
    }

    Ok(config)
}
