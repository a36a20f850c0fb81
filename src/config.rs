use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";

/// Application configuration, layered from `config/default.toml`,
/// `config/{environment}.toml` and `APP__*` environment variables
/// (double underscore as separator, e.g. `APP__DATABASE_URL`).
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL (postgres://... or sqlite::memory:)
    #[validate(length(min = 1))]
    pub database_url: String,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level filter
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_min_connections() -> u32 {
    1
}

fn default_db_connect_timeout_secs() -> u64 {
    30
}

fn default_db_idle_timeout_secs() -> u64 {
    600
}

fn default_db_acquire_timeout_secs() -> u64 {
    8
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Loads configuration from files and environment.
///
/// Missing config files are fine; `APP__DATABASE_URL` alone is a valid
/// setup (this is what the integration tests rely on).
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let mut builder = Config::builder()
        .set_default("environment", run_env.clone())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?;

    let default_file = Path::new(CONFIG_DIR).join("default.toml");
    if default_file.exists() {
        builder = builder.add_source(File::from(default_file));
    }
    let env_file = Path::new(CONFIG_DIR).join(format!("{}.toml", run_env));
    if env_file.exists() {
        builder = builder.add_source(File::from(env_file));
    }

    builder = builder.add_source(Environment::with_prefix("APP").separator("__"));

    let config: AppConfig = builder.build()?.try_deserialize()?;

    config
        .validate()
        .map_err(|e| ConfigError::Message(format!("invalid configuration: {}", e)))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".to_string(),
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
        }
    }

    #[test]
    fn defaults_are_development() {
        let cfg = base_config();
        assert!(!cfg.is_production());
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.db_max_connections, 10);
    }

    #[test]
    fn empty_database_url_fails_validation() {
        let mut cfg = base_config();
        cfg.database_url = String::new();
        assert!(cfg.validate().is_err());
    }
}
