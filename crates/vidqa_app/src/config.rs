use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vidqa_core::SessionSettings;
use vidqa_gateway::GatewaySettings;

use crate::logging::LogDestination;

const CONFIG_FILENAME: &str = "vidqa.ron";
const CONFIG_PATH_ENV: &str = "VIDQA_CONFIG";
const API_BASE_ENV: &str = "VIDQA_API_BASE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub error_display_ms: u64,
    pub log: LogDestination,
    pub verbose: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let gateway = GatewaySettings::default();
        let session = SessionSettings::default();
        Self {
            api_base: gateway.base_url,
            connect_timeout_secs: gateway.connect_timeout.as_secs(),
            request_timeout_secs: gateway.request_timeout.as_secs(),
            error_display_ms: session.error_display.as_millis() as u64,
            log: LogDestination::default(),
            verbose: false,
        }
    }
}

impl AppConfig {
    pub fn gateway_settings(&self) -> GatewaySettings {
        GatewaySettings {
            base_url: self.api_base.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..GatewaySettings::default()
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            error_display: Duration::from_millis(self.error_display_ms),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    fn with_api_base(mut self, api_base: Option<String>) -> Self {
        if let Some(base) = api_base.filter(|b| !b.trim().is_empty()) {
            self.api_base = base;
        }
        self
    }
}

/// Load configuration from `$VIDQA_CONFIG` or `./vidqa.ron`, then apply env overrides.
pub fn load() -> Result<AppConfig, ConfigError> {
    let path = std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));
    let config = load_from(&path)?;
    Ok(config.with_api_base(std::env::var(API_BASE_ENV).ok()))
}

/// A missing file is not an error; it yields the defaults.
pub fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(AppConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    ron::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_from(&temp.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.api_base, "http://localhost:8000");
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            r#"(api_base: "http://qa.internal:9000", error_display_ms: 2500, log: Both)"#,
        )
        .unwrap();

        let config = load_from(&path).unwrap();
        assert_eq!(config.api_base, "http://qa.internal:9000");
        assert_eq!(config.log, LogDestination::Both);
        assert_eq!(
            config.session_settings().error_display,
            Duration::from_millis(2500)
        );
        assert_eq!(
            config.request_timeout_secs,
            AppConfig::default().request_timeout_secs
        );
    }

    #[test]
    fn malformed_file_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        fs::write(&path, "(api_base: 42").unwrap();

        let err = load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn env_base_wins_unless_blank() {
        let config = AppConfig::default().with_api_base(Some("http://10.0.0.2:8000".into()));
        assert_eq!(config.gateway_settings().base_url, "http://10.0.0.2:8000");

        let config = AppConfig::default().with_api_base(Some("   ".into()));
        assert_eq!(config.api_base, "http://localhost:8000");
    }
}
