//! Configuration management

use crate::error::{ErrorContext, WaybillError, WaybillResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaybillConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub polling: PollingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Origin of the delivery backend, e.g. `http://localhost:8080`
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    pub user_agent: String,
}

/// Session persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory holding the session file. Defaults to the platform data dir.
    pub storage_dir: Option<String>,
    /// Storage key of the session record
    pub storage_key: String,
    /// Name of the navigation cookie mirroring the token
    pub cookie_name: String,
    /// Lifetime of the navigation cookie in seconds
    pub cookie_max_age_secs: i64,
    /// Query parameter carrying a one-time bootstrap token
    pub bootstrap_param: String,
}

/// Polling intervals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    pub notifications_interval_secs: u64,
    pub location_interval_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_seconds: 30,
            user_agent: format!("waybill/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_dir: None,
            storage_key: "session".to_string(),
            cookie_name: "jwt_token".to_string(),
            cookie_max_age_secs: 24 * 60 * 60,
            bootstrap_param: "token".to_string(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            notifications_interval_secs: 30,
            location_interval_secs: 30,
        }
    }
}

impl Default for WaybillConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            session: SessionConfig::default(),
            polling: PollingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Resolved directory for the session file
    pub fn storage_path(&self) -> PathBuf {
        match &self.storage_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("waybill"),
        }
    }
}

impl WaybillConfig {
    /// Default location of the config file
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("waybill")
            .join("config.toml")
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> WaybillResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| WaybillError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: WaybillConfig = toml::from_str(&content).map_err(|e| WaybillError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Layer defaults, an optional file and `WAYBILL__SECTION__KEY`
    /// environment variables, later sources winning.
    pub fn load(path: Option<&Path>) -> WaybillResult<Self> {
        let defaults = ::config::Config::try_from(&WaybillConfig::default()).map_err(|e| {
            WaybillError::Config {
                message: format!("Failed to build default config: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("config").with_operation("load"),
            }
        })?;

        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);

        let config: WaybillConfig = ::config::Config::builder()
            .add_source(defaults)
            .add_source(::config::File::from(path).required(false))
            .add_source(
                ::config::Environment::with_prefix("WAYBILL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| WaybillError::Config {
                message: format!("Failed to load config: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("config")
                    .with_operation("load")
                    .with_suggestion("Check the config file and WAYBILL__* variables"),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> WaybillResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| WaybillError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content).map_err(|e| WaybillError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> WaybillResult<()> {
        if let Err(reason) = check_base_url(&self.api.base_url) {
            return Err(WaybillError::Config {
                message: format!("api.base_url {}: {}", reason, self.api.base_url),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set api.base_url to e.g. http://localhost:8080"),
            });
        }

        if self.api.timeout_seconds == 0 {
            return Err(WaybillError::Config {
                message: "api.timeout_seconds must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set api.timeout_seconds to a positive value"),
            });
        }

        if self.session.storage_key.is_empty()
            || self.session.cookie_name.is_empty()
            || self.session.bootstrap_param.is_empty()
        {
            return Err(WaybillError::Config {
                message: "session keys must not be empty".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion(
                        "Set session.storage_key, session.cookie_name and session.bootstrap_param",
                    ),
            });
        }

        if self.session.cookie_max_age_secs <= 0 {
            return Err(WaybillError::Config {
                message: "session.cookie_max_age_secs must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config").with_operation("validate"),
            });
        }

        if self.polling.notifications_interval_secs == 0 || self.polling.location_interval_secs == 0
        {
            return Err(WaybillError::Config {
                message: "polling intervals must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Polling intervals are in seconds, 30 is the usual value"),
            });
        }

        Ok(())
    }
}

fn check_base_url(base_url: &str) -> Result<(), String> {
    let url = Url::parse(base_url).map_err(|e| format!("is not a valid URL ({})", e))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("has unsupported scheme '{}'", other)),
    }
}
