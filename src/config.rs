//! # Configuration Management
//!
//! Centralized configuration for the status client.
//!
//! Covers query defaults (port, protocol version, timeout, SRV discovery),
//! transport limits, and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment overrides via `from_env()`
//!
//! ## Limits
//! - Frames are capped at [`MAX_PACKET_SIZE`] unless configured otherwise
//! - Timeouts must lie between 1ms and [`MAX_TIMEOUT`]

use crate::error::{ProtocolError, Result};
use crate::utils::timeout::{DEFAULT_TIMEOUT, MAX_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

/// Port a server listens on unless told otherwise; SRV discovery only runs
/// for targets on this port.
pub const DEFAULT_PORT: u16 = 25565;

/// Protocol version sent in the handshake. `-1` asks the server to answer
/// regardless of version.
pub const DEFAULT_PROTOCOL_VERSION: i32 = -1;

/// Largest frame accepted (the largest three-byte VarInt)
pub const MAX_PACKET_SIZE: usize = 2_097_151;

/// SRV service label queried in front of the hostname
pub const SRV_PREFIX: &str = "_minecraft._tcp";

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PingConfig {
    /// Query defaults
    #[serde(default)]
    pub client: ClientConfig,

    /// Transport configuration
    #[serde(default)]
    pub transport: TransportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PingConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(timeout) = std::env::var("SLP_TIMEOUT_MS") {
            if let Ok(val) = timeout.parse::<u64>() {
                config.client.timeout = Duration::from_millis(val);
            }
        }

        if let Ok(protocol) = std::env::var("SLP_PROTOCOL_VERSION") {
            if let Ok(val) = protocol.parse::<i32>() {
                config.client.protocol_version = val;
            }
        }

        if let Ok(ignore) = std::env::var("SLP_IGNORE_SRV") {
            if let Ok(val) = ignore.parse::<bool>() {
                config.client.ignore_srv = val;
            }
        }

        if let Ok(size) = std::env::var("SLP_MAX_PACKET_SIZE") {
            if let Ok(val) = size.parse::<usize>() {
                config.transport.max_packet_size = val;
            }
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.client.validate());
        errors.extend(self.transport.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Query defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Port used when a target does not name one
    pub default_port: u16,

    /// Protocol version announced in the handshake
    pub protocol_version: i32,

    /// End-to-end timeout for one query, connect included
    #[serde(with = "duration_serde")]
    pub timeout: Duration,

    /// Skip SRV discovery entirely
    pub ignore_srv: bool,

    /// SRV service label, normally `_minecraft._tcp`
    pub srv_prefix: String,

    /// Reject status text that is not valid JSON
    pub verify_json: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_PORT,
            protocol_version: DEFAULT_PROTOCOL_VERSION,
            timeout: DEFAULT_TIMEOUT,
            ignore_srv: false,
            srv_prefix: String::from(SRV_PREFIX),
            verify_json: true,
        }
    }
}

impl ClientConfig {
    /// Validate client configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.default_port == 0 {
            errors.push("Default port cannot be 0".to_string());
        }

        if self.timeout.is_zero() {
            errors.push("Timeout must be greater than 0".to_string());
        } else if self.timeout > MAX_TIMEOUT {
            errors.push(format!(
                "Timeout too long: {}ms (maximum: {}s)",
                self.timeout.as_millis(),
                MAX_TIMEOUT.as_secs()
            ));
        }

        if !self.ignore_srv {
            if self.srv_prefix.is_empty() {
                errors.push("SRV prefix cannot be empty when SRV lookup is enabled".to_string());
            } else if !self.srv_prefix.starts_with('_') {
                errors.push(format!(
                    "Invalid SRV prefix: '{}' (expected format: '_service._proto')",
                    self.srv_prefix
                ));
            }
        }

        errors
    }
}

/// Transport configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportConfig {
    /// Maximum allowed frame payload in bytes
    pub max_packet_size: usize,

    /// Disable Nagle's algorithm on the TCP socket
    pub nodelay: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_packet_size: MAX_PACKET_SIZE,
            nodelay: true,
        }
    }
}

impl TransportConfig {
    /// Validate transport configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_packet_size == 0 {
            errors.push("Max packet size cannot be 0".to_string());
        } else if self.max_packet_size < 256 {
            errors.push("Max packet size too small (minimum: 256 bytes)".to_string());
        } else if self.max_packet_size > u32::MAX as usize {
            errors.push(format!(
                "Max packet size too large: {} bytes (must fit a VarUint32 length)",
                self.max_packet_size
            ));
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to console
    pub log_to_console: bool,

    /// Whether to log to file
    pub log_to_file: bool,

    /// Path to log file (if log_to_file is true)
    pub log_file_path: Option<String>,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("server-list-ping"),
            log_level: Level::INFO,
            log_to_console: true,
            log_to_file: false,
            log_file_path: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        if self.log_to_file {
            if let Some(ref path) = self.log_file_path {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        errors.push(format!(
                            "Log file directory does not exist: {}",
                            parent.display()
                        ));
                    }
                }
            } else {
                errors.push("log_file_path must be specified when log_to_file is true".to_string());
            }
        }

        if !self.log_to_console && !self.log_to_file {
            errors
                .push("At least one logging output (console or file) must be enabled".to_string());
        }

        errors
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
