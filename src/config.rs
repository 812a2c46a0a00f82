//! Server configuration
//!
//! Configuration is a JSON document read once at startup. It is validated
//! in full before the server binds; any problem aborts startup.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use figment::providers::{Format, Json};
use figment::Figment;
use serde::Deserialize;
use thiserror::Error;

use crate::gallery::SampleMode;

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "webserver-configuration.json";

/// Number of entries returned by the listing API
pub const DEFAULT_SAMPLE_SIZE: usize = 9;

/// Largest accepted upload body
pub const DEFAULT_UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Longest extension kept on stored uploads
pub const MAX_EXTENSION_LEN: usize = 20;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    Missing(PathBuf),

    #[error("invalid configuration: {0}")]
    Parse(#[from] figment::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// One configured media directory
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFolder {
    pub directory: PathBuf,
    pub route: String,
    #[serde(default)]
    pub all_random: bool,
    #[serde(default)]
    pub accepts_uploads: bool,
}

/// Lookup store connection parameters as written in the file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbConnect {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub port: Option<u16>,
    /// Embedded SQLite file, used instead of the networked parameters
    pub path: Option<PathBuf>,
}

/// Validated lookup store settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupSettings {
    Sqlite {
        path: PathBuf,
    },
    Postgres {
        host: String,
        user: String,
        password: String,
        database: String,
        port: u16,
    },
}

impl DbConnect {
    /// Resolve to a backend, naming every missing networked parameter
    pub fn settings(&self) -> Result<LookupSettings, ConfigError> {
        if let Some(path) = &self.path {
            return Ok(LookupSettings::Sqlite { path: path.clone() });
        }

        let mut missing = Vec::new();
        if self.host.is_none() {
            missing.push("host");
        }
        if self.user.is_none() {
            missing.push("user");
        }
        if self.password.is_none() {
            missing.push("password");
        }
        if self.database.is_none() {
            missing.push("database");
        }
        if self.port.is_none() {
            missing.push("port");
        }

        match (&self.host, &self.user, &self.password, &self.database, self.port) {
            (Some(host), Some(user), Some(password), Some(database), Some(port)) => {
                Ok(LookupSettings::Postgres {
                    host: host.clone(),
                    user: user.clone(),
                    password: password.clone(),
                    database: database.clone(),
                    port,
                })
            }
            _ => Err(ConfigError::Invalid(format!(
                "dbConnect is missing {}",
                missing.join(", ")
            ))),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub webpage_folder: PathBuf,
    pub website_url: String,
    pub image_folders: Vec<ImageFolder>,
    #[serde(default)]
    pub db_connect: Option<DbConnect>,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    #[serde(default)]
    pub sample_mode: SampleMode,
    #[serde(default = "default_upload_limit")]
    pub upload_limit_bytes: usize,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_sample_size() -> usize {
    DEFAULT_SAMPLE_SIZE
}

fn default_upload_limit() -> usize {
    DEFAULT_UPLOAD_LIMIT_BYTES
}

impl Config {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }

        let config: Config = Figment::new().merge(Json::file(path)).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config = Figment::new().merge(Json::string(json)).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Lookup store settings, if a store is configured
    pub fn lookup_settings(&self) -> Result<Option<LookupSettings>, ConfigError> {
        self.db_connect.as_ref().map(DbConnect::settings).transpose()
    }

    /// Check everything serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.website_url.starts_with("http://") || self.website_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "websiteUrl must be an http(s) URL, got {:?}",
                self.website_url
            )));
        }

        if self.sample_size == 0 {
            return Err(ConfigError::Invalid("sampleSize must be at least 1".into()));
        }

        let mut seen = HashSet::new();
        for (i, folder) in self.image_folders.iter().enumerate() {
            if !is_route_segment(&folder.route) {
                return Err(ConfigError::Invalid(format!(
                    "imageFolders[{}].route {:?} is not a single path segment",
                    i, folder.route
                )));
            }
            if folder.directory.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "imageFolders[{}].directory is empty",
                    i
                )));
            }
            if !seen.insert(folder.route.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate route {:?} in imageFolders",
                    folder.route
                )));
            }
        }

        self.lookup_settings()?;
        Ok(())
    }
}

/// True if `name` can be used verbatim as one URL path segment
pub fn is_route_segment(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0', '?', '#'])
}
