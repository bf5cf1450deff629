use crate::core::{DriverError, Result};
use crate::utils::BackupPreferences;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default TCP port of a SQL Anywhere engine.
pub const DEFAULT_PORT: u16 = 2638;

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub connection: ConnectionSettings,
    pub backup: Option<BackupPreferences>,
}

/// Connection-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionSettings {
    /// Engine (server) name; one engine can run several databases
    pub engine: String,
    pub database: String,
    pub hostname: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Sends the password as `ENP=` (encrypted form) instead of `PWD=`
    #[serde(default = "default_true")]
    pub password_encrypted: bool,
    /// Owner of the introspected tables; falls back to `username`
    pub schema: Option<String>,
    /// Authentication token for authenticated ("core") databases
    pub auth: Option<String>,
    #[serde(default = "default_charset")]
    pub charset: String,
    /// Table name prefix prepended by every per-table catalog lookup
    /// (`list_columns`, `column_names`, `field_data`, `index_data`,
    /// `foreign_key_data`)
    #[serde(default)]
    pub prefix: String,
    /// Strict mode: failed statements return errors instead of `false`
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub persistent: bool,
}

impl ConnectionSettings {
    /// Settings with defaults for everything but the connection target
    pub fn new(
        engine: impl Into<String>,
        database: impl Into<String>,
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        ConnectionSettings {
            engine: engine.into(),
            database: database.into(),
            hostname: hostname.into(),
            port: DEFAULT_PORT,
            username: username.into(),
            password: password.into(),
            password_encrypted: true,
            schema: None,
            auth: None,
            charset: default_charset(),
            prefix: String::new(),
            debug: false,
            persistent: false,
        }
    }

    /// Effective schema (owner) name
    pub fn schema(&self) -> &str {
        match self.schema.as_deref() {
            Some(schema) if !schema.is_empty() => schema,
            _ => &self.username,
        }
    }

    /// Authentication token, if one is configured and non-empty
    pub fn auth_token(&self) -> Option<&str> {
        self.auth.as_deref().filter(|token| !token.is_empty())
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_true() -> bool {
    true
}

fn default_charset() -> String {
    "utf-8".to_string()
}

/// Loads configuration from a TOML file at the given path.
///
/// # Example
///
/// ```no_run
/// let config = sasql_adapter::config::load_config("sasql.toml").expect("Failed to load config");
/// println!("{:?}", config.connection.engine);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses configuration from TOML text and validates required fields.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    if config.connection.hostname.trim().is_empty() {
        return Err(DriverError::Config("connection.hostname must not be empty".to_string()));
    }
    if config.connection.username.trim().is_empty() {
        return Err(DriverError::Config("connection.username must not be empty".to_string()));
    }
    Ok(config)
}

/// Default location of the configuration file (`<config dir>/sasql/config.toml`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sasql").join("config.toml"))
}
