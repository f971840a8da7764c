//! # Configuration File
//!
//! `layerconf.toml` settings for the server, the record source and logging.
//! Every field has a default, so an empty or missing file is valid.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [graph]
//! records = "nodes.json"
//!
//! [log]
//! format = "json"
//! ```

use layerconf_core::LayerConfError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "layerconf.toml";

/// Environment override for `[log] format`.
pub const LOG_FORMAT_ENV: &str = "LAYERCONF_LOG_FORMAT";

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSection {
    /// `host:port` for binding.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `[graph]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSection {
    /// JSON export of node records. No records means an empty graph.
    #[serde(default)]
    pub records: Option<PathBuf>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Parse the environment override; anything but "json" is text.
    #[must_use]
    pub fn from_env_value(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// `[log]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSection {
    #[serde(default)]
    pub format: LogFormat,
}

/// Parsed `layerconf.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub graph: GraphSection,
    #[serde(default)]
    pub log: LogSection,
}

impl AppConfig {
    /// Parse TOML content.
    pub fn parse(content: &str) -> Result<Self, LayerConfError> {
        toml::from_str(content)
            .map_err(|e| LayerConfError::SerializationError(format!("Invalid config: {}", e)))
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, LayerConfError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LayerConfError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Load the explicit path, else `layerconf.toml` if present, else defaults.
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file is not.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, LayerConfError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Log format after applying the `LAYERCONF_LOG_FORMAT` override.
    #[must_use]
    pub fn effective_log_format(&self, env_value: Option<&str>) -> LogFormat {
        env_value.map_or(self.log.format, LogFormat::from_env_value)
    }
}

// =============================================================================
// TESTS
// =============================================================================
