//! Configuration file support for fpmsyncd
//!
//! Loads and validates fpmsyncd configuration from TOML files.
//! Default location: /etc/sonic/fpmsyncd.conf
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - CM-6: Configuration Settings - Validated daemon settings

use crate::error::{FpmsyncError, Result};
use crate::fpm_link::FPM_DEFAULT_PORT;
use crate::metrics_server::DEFAULT_METRICS_PORT;
use crate::redis_adapter::APPL_DB;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/sonic/fpmsyncd.conf";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// FPM listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FpmConfig {
    /// Address the FPM listener binds to
    #[serde(default = "default_listen_address")]
    pub listen_address: IpAddr,

    #[serde(default = "default_fpm_port")]
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_redis_host")]
    pub redis_host: String,

    #[serde(default = "default_redis_port")]
    pub redis_port: u16,

    /// Redis database number for APPL_DB
    #[serde(default = "default_appl_db_number")]
    pub appl_db_number: i64,
}

/// Prometheus endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,

    #[serde(default = "default_metrics_address")]
    pub listen_address: IpAddr,

    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter; `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Complete fpmsyncd configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FpmsyncConfig {
    #[serde(default)]
    pub fpm: FpmConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_listen_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_fpm_port() -> u16 {
    FPM_DEFAULT_PORT
}

fn default_redis_host() -> String {
    "127.0.0.1".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_appl_db_number() -> i64 {
    APPL_DB
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_metrics_address() -> IpAddr {
    IpAddr::V6(Ipv6Addr::LOCALHOST)
}

fn default_metrics_port() -> u16 {
    DEFAULT_METRICS_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for FpmConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            port: default_fpm_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            redis_host: default_redis_host(),
            redis_port: default_redis_port(),
            appl_db_number: default_appl_db_number(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            listen_address: default_metrics_address(),
            port: default_metrics_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl FpmsyncConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                FpmsyncError::Config(format!(
                    "Failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Logging is not up yet; its level comes from this file
                eprintln!(
                    "fpmsyncd: Config file {} not found, using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(FpmsyncError::Io(e)),
        }
    }

    /// Load from default location or defaults
    pub fn load() -> Result<Self> {
        Self::load_or_default(DEFAULT_CONFIG_PATH)
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.fpm.listen_address, self.fpm.port)
    }

    pub fn metrics_addr(&self) -> SocketAddr {
        SocketAddr::new(self.metrics.listen_address, self.metrics.port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.fpm.port == 0 {
            return Err(FpmsyncError::Config("fpm port must be > 0".to_string()));
        }

        if self.database.redis_port == 0 {
            return Err(FpmsyncError::Config("redis_port must be > 0".to_string()));
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(FpmsyncError::Config("metrics port must be > 0".to_string()));
        }

        if self.metrics.enabled && self.metrics.port == self.fpm.port {
            return Err(FpmsyncError::Config(format!(
                "metrics port {} collides with the fpm port",
                self.metrics.port
            )));
        }

        if self.database.appl_db_number < 0 {
            return Err(FpmsyncError::Config(
                "appl_db_number must be >= 0".to_string(),
            ));
        }

        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(FpmsyncError::Config(format!(
                "unknown log level '{}', expected one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }
}
