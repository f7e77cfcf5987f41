use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub avatar_api_key: String,
    pub avatar_base_url: String,
    pub avatar_name: String,
    pub avatar_quality: String,
    pub lesson_language: String,
    pub voice_rate: f32,
    pub lessons_path: PathBuf,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let avatar_api_key = std::env::var("AVATAR_API_KEY")
            .map_err(|_| ConfigError::MissingVar("AVATAR_API_KEY".to_string()))?;

        let avatar_base_url = std::env::var("AVATAR_BASE_URL")
            .unwrap_or_else(|_| "https://api.heygen.com".to_string());

        let avatar_name =
            std::env::var("AVATAR_NAME").unwrap_or_else(|_| "June_HR_public".to_string());

        let avatar_quality = std::env::var("AVATAR_QUALITY").unwrap_or_else(|_| "medium".to_string());

        let lesson_language = std::env::var("LESSON_LANGUAGE").unwrap_or_else(|_| "es".to_string());

        let voice_rate_str = std::env::var("VOICE_RATE").unwrap_or_else(|_| "1.1".to_string());
        let voice_rate = voice_rate_str.parse::<f32>().map_err(|_| {
            ConfigError::InvalidValue(
                "VOICE_RATE".to_string(),
                format!("'{}' is not a valid rate", voice_rate_str),
            )
        })?;

        let lessons_path = std::env::var("LESSONS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./lessons"));

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            avatar_api_key,
            avatar_base_url,
            avatar_name,
            avatar_quality,
            lesson_language,
            voice_rate,
            lessons_path,
            log_level,
        })
    }
}
