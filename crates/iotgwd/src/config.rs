//! TOML configuration for the daemon
//!
//! Every section and field has a default, so an empty file (or no file)
//! yields a working configuration. Command-line flags override file values.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level daemon configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
    pub seed: SeedConfig,
}

/// Listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
        }
    }
}

/// REST API settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// Mount `POST /api/testing/reset`
    pub testing_routes: bool,
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "iotgwd=info,iotgw_api=info,iotgw_core=debug".to_string(),
            json: false,
        }
    }
}

/// Startup fixtures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedConfig {
    /// JSON fixture file loaded into the store before serving
    pub path: Option<PathBuf>,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub testing_routes: bool,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse TOML text
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply command-line values over file values
    pub fn merge(mut self, overrides: Overrides) -> Self {
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        self.api.testing_routes |= overrides.testing_routes;
        self
    }

    /// Address to bind, as `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.bind_address(), "0.0.0.0:3001");
        assert!(!config.api.testing_routes);
        assert_eq!(config.seed.path, None);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [server]
            port = 8080

            [logging]
            json = true
            "#,
        )
        .unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert!(config.logging.json);
        assert_eq!(
            config.logging.filter,
            "iotgwd=info,iotgw_api=info,iotgw_core=debug"
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse("[server]\nprot = 1\n").is_err());
    }

    #[test]
    fn overrides_win() {
        let config = Config::default().merge(Overrides {
            host: Some("127.0.0.1".into()),
            port: Some(9000),
            testing_routes: true,
        });
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert!(config.api.testing_routes);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[api]\ntesting_routes = true\n\n[seed]\npath = \"fixtures.json\""
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert!(config.api.testing_routes);
        assert_eq!(config.seed.path, Some(PathBuf::from("fixtures.json")));
    }

    #[test]
    fn missing_file_names_path() {
        let err = Config::load_from(Path::new("/nonexistent/iotgwd.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/iotgwd.toml"));
    }
}
