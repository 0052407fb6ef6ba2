use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub ide: IdeConfig,
    pub logging: LoggingConfig,
}

/// Coordinates of the IDE instance hosting the database exposer.
#[derive(Debug, Clone, Deserialize)]
pub struct IdeConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    /// Print server-side stack traces when a remote call fails.
    pub noisy: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("ide.host", "127.0.0.1")?
            .set_default("ide.port", 63342)?
            .set_default("ide.request_timeout_secs", 30)?
            .set_default("ide.noisy", false)?
            .set_default("logging.level", "info")?;

        // Load from environment variables
        if let Ok(host) = env::var("IDE_HOST") {
            builder = builder.set_override("ide.host", host)?;
        }

        if let Ok(port) = env::var("IDE_PORT") {
            builder = builder.set_override("ide.port", port.parse::<u16>().unwrap_or(63342))?;
        }

        if let Ok(timeout) = env::var("IDE_REQUEST_TIMEOUT_SECS") {
            builder = builder
                .set_override("ide.request_timeout_secs", timeout.parse::<u64>().unwrap_or(30))?;
        }

        if let Ok(noisy) = env::var("IDE_NOISY") {
            builder = builder.set_override("ide.noisy", noisy == "1" || noisy == "true")?;
        }

        if let Ok(log_level) = env::var("RUST_LOG") {
            builder = builder.set_override("logging.level", log_level)?;
        }

        // Try to load from .env file
        let _ = dotenv::dotenv();

        builder.build()?.try_deserialize()
    }

    pub fn ide_url(&self) -> String {
        format!("http://{}:{}", self.ide.host, self.ide.port)
    }
}
