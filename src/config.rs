use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::path::Path;
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::clock::DayCalendar;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";

/// Who receives the critical alert raised when a tool reaches its daily cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CapBreachTarget {
    #[default]
    Client,
    Tool,
}

/// Thresholds and switches used by the consumption recorder.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ConsumptionPolicy {
    /// Stock level (in the product's unit) at or below which a product alert fires
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: Decimal,

    /// Daily usage percentage that raises a warning on the tool
    #[serde(default = "default_warning_threshold_pct")]
    pub warning_threshold_pct: Decimal,

    /// Daily usage percentage that raises a critical alert
    #[serde(default = "default_critical_threshold_pct")]
    pub critical_threshold_pct: Decimal,

    #[serde(default)]
    pub cap_breach_alert_target: CapBreachTarget,

    /// Reject consumptions whose client, product or tool does not exist
    #[serde(default)]
    pub strict_references: bool,

    /// Offset (minutes east of UTC) that defines a calendar day; host offset when unset
    #[serde(default)]
    #[validate(range(min = -1439, max = 1439))]
    pub utc_offset_minutes: Option<i32>,
}

impl Default for ConsumptionPolicy {
    fn default() -> Self {
        Self {
            low_stock_threshold: default_low_stock_threshold(),
            warning_threshold_pct: default_warning_threshold_pct(),
            critical_threshold_pct: default_critical_threshold_pct(),
            cap_breach_alert_target: CapBreachTarget::default(),
            strict_references: false,
            utc_offset_minutes: None,
        }
    }
}

impl ConsumptionPolicy {
    pub fn calendar(&self) -> DayCalendar {
        DayCalendar::from_offset_minutes(self.utc_offset_minutes)
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// Seed the store with demo stores, tools and products at startup
    #[serde(default)]
    pub seed_sample_data: bool,

    /// Event channel capacity for async event processing
    #[serde(default = "default_event_channel_capacity")]
    #[validate(custom = "validate_event_channel_capacity")]
    pub event_channel_capacity: usize,

    #[serde(default)]
    #[validate]
    pub consumption: ConsumptionPolicy,
}

impl AppConfig {
    /// Creates a new configuration with defaults for everything but the bind address
    pub fn new(host: String, port: u16, environment: String) -> Self {
        Self {
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            seed_sample_data: false,
            event_channel_capacity: default_event_channel_capacity(),
            consumption: ConsumptionPolicy::default(),
        }
    }

    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Returns true if explicit CORS origins are configured
    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_ref()
            .map(|raw| raw.split(',').any(|origin| !origin.trim().is_empty()))
            .unwrap_or(false)
    }

    /// Whether we should fall back to permissive CORS
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.should_allow_permissive_cors() && !self.has_cors_allowed_origins() {
            let mut err = ValidationError::new("cors_allowed_origins_required");
            err.message = Some(
                "Set APP__CORS_ALLOWED_ORIGINS for non-development environments or explicitly opt-in via APP__CORS_ALLOW_ANY_ORIGIN=true".into(),
            );
            errors.add("cors_allowed_origins", err);
        }

        let policy = &self.consumption;
        if policy.warning_threshold_pct >= policy.critical_threshold_pct {
            let mut err = ValidationError::new("warning_threshold_pct");
            err.message =
                Some("warning_threshold_pct must be lower than critical_threshold_pct".into());
            errors.add("consumption", err);
        }
        if policy.warning_threshold_pct.is_sign_negative()
            || policy.low_stock_threshold.is_sign_negative()
        {
            let mut err = ValidationError::new("negative_threshold");
            err.message = Some("consumption thresholds must not be negative".into());
            errors.add("consumption", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_event_channel_capacity() -> usize {
    1024
}

fn default_low_stock_threshold() -> Decimal {
    Decimal::from(50)
}

fn default_warning_threshold_pct() -> Decimal {
    Decimal::from(90)
}

fn default_critical_threshold_pct() -> Decimal {
    Decimal::from(100)
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_event_channel_capacity(capacity: usize) -> Result<(), ValidationError> {
    if capacity == 0 {
        let mut err = ValidationError::new("event_channel_capacity");
        err.message = Some("event_channel_capacity must be greater than 0".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("stockdash_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    load_config_from(Path::new(CONFIG_DIR), &run_env)
}

/// Same layering as [`load_config`], reading files from `dir`.
pub fn load_config_from(dir: &Path, run_env: &str) -> Result<AppConfig, AppConfigError> {
    info!("Loading configuration for environment: {}", run_env);

    if !dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            dir.display()
        );
    }

    let config = Config::builder()
        .set_default("host", "0.0.0.0")?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", run_env)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("seed_sample_data", run_env == DEFAULT_ENV)?
        .add_source(File::from(dir.join("default")).required(false))
        .add_source(File::from(dir.join(run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}


#[cfg(test)]
mod policy_tests {
    use super::*;
    use std::str::FromStr;

    fn dev_config() -> AppConfig {
        AppConfig::new("127.0.0.1".into(), 8080, "development".into())
    }

    #[test]
    fn defaults_match_documented_thresholds() {
        let policy = ConsumptionPolicy::default();
        assert_eq!(policy.low_stock_threshold, Decimal::from(50));
        assert_eq!(policy.warning_threshold_pct, Decimal::from(90));
        assert_eq!(policy.critical_threshold_pct, Decimal::from(100));
        assert_eq!(policy.cap_breach_alert_target, CapBreachTarget::Client);
        assert!(!policy.strict_references);
    }

    #[test]
    fn warning_must_stay_below_critical() {
        let mut cfg = dev_config();
        cfg.consumption.warning_threshold_pct = Decimal::from(100);
        assert!(cfg.validate_additional_constraints().is_err());
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let mut cfg = dev_config();
        cfg.log_level = "loud".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_event_channel_capacity_is_rejected() {
        let mut cfg = dev_config();
        assert!(cfg.validate().is_ok());
        cfg.event_channel_capacity = 0;
        let errors = cfg.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("event_channel_capacity"));
    }

    #[test]
    fn cap_breach_target_parses() {
        assert_eq!(
            CapBreachTarget::from_str("tool").unwrap(),
            CapBreachTarget::Tool
        );
    }

    #[test]
    fn policy_deserialises_from_toml_source() {
        let config = Config::builder()
            .add_source(config::File::from_str(
                r#"
                low_stock_threshold = 20
                cap_breach_alert_target = "tool"
                utc_offset_minutes = 60
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let policy: ConsumptionPolicy = config.try_deserialize().unwrap();
        assert_eq!(policy.low_stock_threshold, Decimal::from(20));
        assert_eq!(policy.cap_breach_alert_target, CapBreachTarget::Tool);
        assert_eq!(policy.utc_offset_minutes, Some(60));
        assert_eq!(policy.warning_threshold_pct, Decimal::from(90));
    }

    #[test]
    fn environment_file_overrides_default_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            "port = 9000\nlog_level = \"debug\"\n[consumption]\nlow_stock_threshold = 30\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("staging.toml"),
            "port = 9100\ncors_allow_any_origin = true\n[consumption]\nstrict_references = true\n",
        )
        .unwrap();

        let cfg = load_config_from(dir.path(), "staging").unwrap();
        assert_eq!(cfg.port, 9100);
        assert_eq!(cfg.log_level(), "debug");
        assert_eq!(cfg.environment, "staging");
        assert!(!cfg.seed_sample_data);
        assert!(cfg.consumption.strict_references);
        // nested tables replace per key, not wholesale
        assert_eq!(cfg.consumption.low_stock_threshold, Decimal::from(30));
    }

    #[test]
    fn missing_directory_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent"), "development").unwrap();
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert!(cfg.seed_sample_data);
        assert_eq!(cfg.event_channel_capacity, 1024);
    }
}
