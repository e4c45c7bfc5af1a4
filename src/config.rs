//! Configuration management for the fraud scoring service

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file, optional
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Prefix for environment overrides, e.g. `FRAUD_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "FRAUD";

/// Deployment environment
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Requests without an API key are accepted; missing model degrades
    #[default]
    Development,
    Staging,
    /// Missing model artifacts are fatal at startup
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }

    pub fn is_development(&self) -> bool {
        *self == Environment::Development
    }
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub model: ModelConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

/// HTTP listener
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// API-key check and CORS
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Header carrying the API key
    pub api_key_header: String,
    /// Accepted keys; when empty the `API_KEY` environment variable is used
    pub api_keys: Vec<String>,
    /// Allowed CORS origins; `*` allows any origin
    pub cors_origins: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            api_key_header: "X-API-Key".to_string(),
            api_keys: Vec::new(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:8081".to_string(),
                "http://localhost:19006".to_string(),
            ],
        }
    }
}

/// Model artifact locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Classifier artifact (`.json` forest export or `.onnx`)
    pub model_path: PathBuf,
    /// Amount scaler artifact
    pub scaler_path: PathBuf,
    /// Ordered feature-name list
    pub features_path: PathBuf,
    /// Fill in tree metadata missing from older exports while loading
    pub repair_on_load: bool,
    /// Number of threads for ONNX inference
    pub onnx_threads: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("ml/models/fraud_classifier.json"),
            scaler_path: PathBuf::from("ml/scalers/amount_scaler.json"),
            features_path: PathBuf::from("ml/models/feature_columns.json"),
            repair_on_load: true,
            onnx_threads: 1,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), overridden by `RUST_LOG`
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Runtime metrics reporting
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Seconds between summary log lines; 0 disables the reporter
    pub report_interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: 60,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file and environment
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific path, then apply environment overrides.
    ///
    /// The file is optional. The bare `ENVIRONMENT` variable takes precedence
    /// over both sources.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.api_keys")
                    .with_list_parse_key("security.cors_origins")
                    .try_parsing(true),
            )
            .set_override_option("environment", std::env::var("ENVIRONMENT").ok())
            .context("Failed to apply ENVIRONMENT override")?
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Listener address as `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.security.api_key_header, "X-API-Key");
        assert!(config.security.api_keys.is_empty());
        assert!(config.model.repair_on_load);
        assert_eq!(
            config.model.model_path,
            PathBuf::from("ml/models/fraud_classifier.json")
        );
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        // Listed origins only, so credentials stay allowed
        assert_eq!(config.security.cors_origins.len(), 3);
        assert!(!config.security.cors_origins.iter().any(|o| o == "*"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
environment = "staging"

[server]
port = 9100

[security]
api_keys = ["k1", "k2"]
cors_origins = ["*"]

[model]
model_path = "artifacts/forest.json"
repair_on_load = false

[logging]
format = "json"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        // ENVIRONMENT may be set by the host; only assert when it isn't
        if std::env::var("ENVIRONMENT").is_err() {
            assert_eq!(config.environment, Environment::Staging);
        }
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.security.api_keys, vec!["k1", "k2"]);
        assert_eq!(config.security.cors_origins, vec!["*"]);
        assert_eq!(config.model.model_path, PathBuf::from("artifacts/forest.json"));
        assert!(!config.model.repair_on_load);
        assert_eq!(config.model.onnx_threads, 1);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_from_path("does/not/exist.toml").unwrap();
        assert_eq!(config.security.api_key_header, "X-API-Key");
        assert_eq!(config.metrics.report_interval_secs, 60);
    }

    #[test]
    fn test_environment_flags() {
        assert!(Environment::Production.is_production());
        assert!(!Environment::Staging.is_production());
        assert!(Environment::Development.is_development());
    }
}
