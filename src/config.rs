//! Configuration management for Windowgate.
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! `WINDOWGATE_*` environment variables (nested keys separated by `__`, e.g.
//! `WINDOWGATE_LIMIT__QUOTA=60`). A plain `PORT` variable overrides the
//! listening port last.

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{Result, WindowgateError};
use crate::ratelimit::{Limit, LimitSettings};

/// Environment variable overriding the listening port.
pub const PORT_ENV: &str = "PORT";
/// Prefix for layered environment overrides.
const ENV_PREFIX: &str = "WINDOWGATE";

/// Main configuration for the Windowgate service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WindowgateConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limit applied to every client
    #[serde(default)]
    pub limit: LimitSettings,

    /// Idle client eviction
    #[serde(default)]
    pub eviction: EvictionConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// HTTP port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    80
}

impl ServerConfig {
    /// The socket address to bind.
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Apply the value of the `PORT` environment variable, if any, and
    /// report where the final port came from.
    pub fn apply_port_override(&mut self, value: Option<&str>) -> Result<PortSource> {
        let source = match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(port) => {
                self.port = port.parse().map_err(|e| {
                    WindowgateError::Config(format!("invalid {} {:?}: {}", PORT_ENV, port, e))
                })?;
                info!("Using port {} from {}", self.port, PORT_ENV);
                PortSource::Environment
            }
            None if self.port == default_port() => {
                info!("Defaulting to port {}", self.port);
                PortSource::Default
            }
            None => {
                info!("Using configured port {}", self.port);
                PortSource::Configured
            }
        };
        Ok(source)
    }
}

/// Where the listening port was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortSource {
    /// The `PORT` environment variable
    Environment,
    /// The configuration file or `WINDOWGATE_SERVER__PORT`
    Configured,
    /// Nothing set it
    Default,
}

/// Idle client eviction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvictionConfig {
    /// Seconds without traffic before a client record is dropped
    #[serde(default = "default_idle_secs")]
    pub idle_secs: u64,

    /// Seconds between eviction sweeps; 0 disables sweeping
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for EvictionConfig {
    fn default() -> Self {
        Self {
            idle_secs: default_idle_secs(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_idle_secs() -> u64 {
    300
}

fn default_sweep_interval() -> u64 {
    60
}

impl EvictionConfig {
    /// Idle period after which a client is evicted.
    pub fn idle(&self) -> Duration {
        Duration::from_secs(self.idle_secs)
    }

    /// Interval between sweeps, or `None` when sweeping is disabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}

impl WindowgateConfig {
    /// Load layered configuration from an optional YAML file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            info!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml));
        }

        let mut config: WindowgateConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        let port = std::env::var(PORT_ENV).ok();
        config.server.apply_port_override(port.as_deref())?;
        Ok(config)
    }

    /// Load configuration from a YAML file path, without environment layering.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| WindowgateError::Config(format!("Failed to parse configuration: {}", e)))
    }

    /// The validated rate limit.
    pub fn limit(&self) -> Result<Limit> {
        Limit::try_from(self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WindowgateConfig::default();
        assert_eq!(config.server.addr(), "0.0.0.0:80".parse().unwrap());
        assert_eq!(config.limit().unwrap(), Limit::default());
        assert_eq!(config.eviction.idle(), Duration::from_secs(300));
        assert_eq!(config.eviction.sweep_interval(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
server:
  port: 9000
limit:
  quota: 10
  window_secs: 1
"#;
        let config = WindowgateConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, default_host());
        assert_eq!(config.limit().unwrap(), Limit::per_secs(10, 1).unwrap());
        assert_eq!(config.eviction.sweep_interval_secs, 60);
    }

    #[test]
    fn test_invalid_limit_rejected() {
        let config = WindowgateConfig::from_yaml("limit:\n  quota: 0\n").unwrap();
        assert!(matches!(config.limit(), Err(WindowgateError::Config(_))));
    }

    #[test]
    fn test_malformed_yaml_rejected() {
        assert!(WindowgateConfig::from_yaml("server: [").is_err());
    }

    #[test]
    fn test_port_override() {
        let mut server = ServerConfig::default();

        assert_eq!(server.apply_port_override(None).unwrap(), PortSource::Default);
        assert_eq!(server.port, 80);

        assert_eq!(
            server.apply_port_override(Some("3000")).unwrap(),
            PortSource::Environment
        );
        assert_eq!(server.port, 3000);

        assert_eq!(server.apply_port_override(None).unwrap(), PortSource::Configured);
        assert_eq!(server.apply_port_override(Some("")).unwrap(), PortSource::Configured);
        assert_eq!(server.port, 3000);

        assert!(server.apply_port_override(Some("not-a-port")).is_err());
    }

    #[test]
    fn test_port_from_file_is_reported_as_configured() {
        let mut config = WindowgateConfig::from_yaml("server:\n  port: 9000\n").unwrap();
        assert_eq!(
            config.server.apply_port_override(None).unwrap(),
            PortSource::Configured
        );
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_sweeping_can_be_disabled() {
        let eviction = EvictionConfig {
            idle_secs: 10,
            sweep_interval_secs: 0,
        };
        assert_eq!(eviction.sweep_interval(), None);
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("windowgate-file-{}.yaml", std::process::id()));
        std::fs::write(&path, "limit:\n  quota: 12\n  window_secs: 3\neviction:\n  idle_secs: 30\n").unwrap();

        let config = WindowgateConfig::from_file(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.limit().unwrap(), Limit::per_secs(12, 3).unwrap());
        assert_eq!(config.eviction.idle_secs, 30);
        assert_eq!(config.server.port, 80);
    }

    #[test]
    fn test_from_file_missing_path_is_io_error() {
        let path = std::env::temp_dir().join("windowgate-does-not-exist.yaml");
        let result = WindowgateConfig::from_file(path.to_str().unwrap());
        assert!(matches!(result, Err(WindowgateError::Io(_))));
    }
}
