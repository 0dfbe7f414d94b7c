use crate::error::{AppError, Result};

pub const DEFAULT_API_HOST: &str = "0.0.0.0";
pub const DEFAULT_API_PORT: u16 = 5000;

/// Cutoff for the high-risk listings.
pub const HIGH_RISK_THRESHOLD: f64 = 0.8;

/// Row cap for the high-risk listings when the client does not supply one.
pub const DEFAULT_HIGH_RISK_LIMIT: i64 = 50;

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string (DATABASE_URL). None when unset or empty.
    pub database_url: Option<String>,
    pub api_host: String,
    pub api_port: u16,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. `from_env` passes the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_port = match lookup("API_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                AppError::Config(format!("API_PORT must be a valid port number, got {raw:?}"))
            })?,
            None => DEFAULT_API_PORT,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            api_host: lookup("API_HOST").unwrap_or_else(|| DEFAULT_API_HOST.to_string()),
            api_port,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}
