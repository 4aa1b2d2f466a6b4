use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8000;
const CONFIG_DIR: &str = "config";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
const DEFAULT_RAZORPAY_BASE_URL: &str = "https://api.razorpay.com";
const DEFAULT_TWILIO_BASE_URL: &str = "https://api.twilio.com";

/// Origins that are additionally trusted when `debug` is enabled.
const DEBUG_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://127.0.0.1:5173",
    "http://127.0.0.1:3000",
];

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    pub host: String,

    #[serde(default = "default_port")]
    #[validate(range(min = 1))]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Enables the local development CORS origins
    #[serde(default)]
    pub debug: bool,

    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// Storefront origin allowed by CORS
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,

    /// Directory uploaded images are written under
    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,

    /// Public prefix used to build `image_url`
    #[serde(default = "default_media_url")]
    pub media_url: String,

    #[serde(default = "default_max_image_bytes")]
    #[validate(range(min = 1))]
    pub max_image_bytes: usize,

    #[serde(default = "default_image_max_width")]
    #[validate(range(min = 1))]
    pub image_max_width: u32,

    #[serde(default = "default_image_jpeg_quality")]
    #[validate(range(min = 1, max = 100))]
    pub image_jpeg_quality: u8,

    /// Timeout applied to every outbound gateway/messaging call
    #[serde(default = "default_outbound_timeout_secs")]
    #[validate(range(min = 1, max = 120))]
    pub outbound_timeout_secs: u64,

    /// Overall per-request timeout enforced by the HTTP layer
    #[serde(default = "default_request_timeout_secs")]
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,

    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Razorpay public key id, returned to the checkout client
    #[serde(default)]
    pub razorpay_key_id: Option<String>,
    /// Razorpay secret, used for API auth and signature verification
    #[serde(default)]
    pub razorpay_key_secret: Option<String>,
    #[serde(default = "default_razorpay_base_url")]
    pub razorpay_base_url: String,

    #[serde(default)]
    pub twilio_account_sid: Option<String>,
    #[serde(default)]
    pub twilio_auth_token: Option<String>,
    /// Sender address, e.g. `whatsapp:+14155238886`
    #[serde(default)]
    pub twilio_whatsapp_from: Option<String>,
    /// Shop owner's address that receives order notifications
    #[serde(default)]
    pub twilio_whatsapp_to: Option<String>,
    #[serde(default = "default_twilio_base_url")]
    pub twilio_base_url: String,
}

/// Credentials and endpoint for the payment gateway adapter.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub key_id: Option<String>,
    pub key_secret: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

/// Credentials and endpoint for the notification adapter.
#[derive(Clone, Debug)]
pub struct MessagingConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub whatsapp_from: Option<String>,
    pub whatsapp_to: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

/// Settings for the image normalizer.
#[derive(Clone, Debug)]
pub struct MediaConfig {
    pub root: PathBuf,
    pub url_prefix: String,
    pub max_bytes: usize,
    pub max_width: u32,
    pub jpeg_quality: u8,
}

impl AppConfig {
    /// Creates a configuration with defaults for everything but the essentials
    pub fn new(database_url: String, host: String, port: u16, environment: String) -> Self {
        Self {
            database_url,
            host,
            port,
            environment,
            debug: false,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            frontend_url: default_frontend_url(),
            media_root: default_media_root(),
            media_url: default_media_url(),
            max_image_bytes: default_max_image_bytes(),
            image_max_width: default_image_max_width(),
            image_jpeg_quality: default_image_jpeg_quality(),
            outbound_timeout_secs: default_outbound_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            razorpay_key_id: None,
            razorpay_key_secret: None,
            razorpay_base_url: DEFAULT_RAZORPAY_BASE_URL.to_string(),
            twilio_account_sid: None,
            twilio_auth_token: None,
            twilio_whatsapp_from: None,
            twilio_whatsapp_to: None,
            twilio_base_url: DEFAULT_TWILIO_BASE_URL.to_string(),
        }
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn outbound_timeout(&self) -> Duration {
        Duration::from_secs(self.outbound_timeout_secs)
    }

    pub fn gateway(&self) -> GatewayConfig {
        GatewayConfig {
            key_id: non_blank(&self.razorpay_key_id),
            key_secret: non_blank(&self.razorpay_key_secret),
            base_url: self.razorpay_base_url.trim_end_matches('/').to_string(),
            timeout: self.outbound_timeout(),
        }
    }

    pub fn messaging(&self) -> MessagingConfig {
        MessagingConfig {
            account_sid: non_blank(&self.twilio_account_sid),
            auth_token: non_blank(&self.twilio_auth_token),
            whatsapp_from: non_blank(&self.twilio_whatsapp_from),
            whatsapp_to: non_blank(&self.twilio_whatsapp_to),
            base_url: self.twilio_base_url.trim_end_matches('/').to_string(),
            timeout: self.outbound_timeout(),
        }
    }

    pub fn media(&self) -> MediaConfig {
        MediaConfig {
            root: self.media_root.clone(),
            url_prefix: self.media_url.clone(),
            max_bytes: self.max_image_bytes,
            max_width: self.image_max_width,
            jpeg_quality: self.image_jpeg_quality,
        }
    }

    /// Origins accepted by the CORS layer
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = vec![self.frontend_url.trim_end_matches('/').to_string()];
        if self.debug {
            for origin in DEBUG_ORIGINS {
                if !origins.iter().any(|o| o == origin) {
                    origins.push(origin.to_string());
                }
            }
        }
        origins
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.frontend_url.trim().is_empty() {
            let mut err = ValidationError::new("frontend_url_required");
            err.message = Some("Set APP__FRONTEND_URL to the storefront origin".into());
            errors.add("frontend_url", err);
        }

        if !self.media_url.ends_with('/') {
            let mut err = ValidationError::new("media_url_trailing_slash");
            err.message = Some("media_url must end with '/'".into());
            errors.add("media_url", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_frontend_url() -> String {
    DEFAULT_FRONTEND_URL.to_string()
}

fn default_media_root() -> PathBuf {
    PathBuf::from("media")
}

fn default_media_url() -> String {
    "/media/".to_string()
}

fn default_max_image_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_image_max_width() -> u32 {
    1200
}

fn default_image_jpeg_quality() -> u8 {
    85
}

fn default_outbound_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    8
}
fn default_db_idle_timeout_secs() -> u64 {
    300
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_razorpay_base_url() -> String {
    DEFAULT_RAZORPAY_BASE_URL.to_string()
}

fn default_twilio_base_url() -> String {
    DEFAULT_TWILIO_BASE_URL.to_string()
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

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!(
        "apparel_storefront={level},storefront_api={level},tower_http=info,sea_orm=warn"
    );
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);
    let filter = EnvFilter::new(filter_directive);

    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
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
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("database_url", "sqlite://storefront.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
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

    if app_config.gateway().key_secret.is_none() {
        info!("Razorpay credentials not configured; online payments will be rejected");
    }
    if app_config.messaging().account_sid.is_none() {
        info!("Twilio credentials not configured; order notifications will be skipped with a warning");
    }

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            "127.0.0.1".into(),
            8000,
            "production".into(),
        )
    }

    #[test]
    fn defaults_pass_validation() {
        let cfg = base_config();
        assert!(cfg.validate().is_ok());
        assert!(cfg.validate_additional_constraints().is_ok());
        assert_eq!(cfg.outbound_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.media().max_width, 1200);
        assert_eq!(cfg.media().jpeg_quality, 85);
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut cfg = base_config();
        cfg.log_level = "verbose".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_unbounded_outbound_timeout() {
        let mut cfg = base_config();
        cfg.outbound_timeout_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn blank_credentials_are_treated_as_absent() {
        let mut cfg = base_config();
        cfg.razorpay_key_id = Some("rzp_test_123".into());
        cfg.razorpay_key_secret = Some("   ".into());
        let gateway = cfg.gateway();
        assert_eq!(gateway.key_id.as_deref(), Some("rzp_test_123"));
        assert!(gateway.key_secret.is_none());
    }

    #[test]
    fn debug_adds_local_origins() {
        let mut cfg = base_config();
        assert_eq!(cfg.allowed_origins(), vec![DEFAULT_FRONTEND_URL.to_string()]);

        cfg.debug = true;
        let origins = cfg.allowed_origins();
        assert_eq!(origins.len(), 4);
        assert!(origins.contains(&"http://127.0.0.1:5173".to_string()));
    }

    #[test]
    fn media_url_requires_trailing_slash() {
        let mut cfg = base_config();
        cfg.media_url = "/media".into();
        assert!(cfg.validate_additional_constraints().is_err());
    }
}
