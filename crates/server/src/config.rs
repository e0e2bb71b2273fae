//! Process configuration loaded once at startup.
//!
//! The environment is read exactly once in `main`; the resulting [`Config`]
//! is handed to the services, nothing reads variables ad hoc afterwards.

use thiserror::Error;

/// Environment variable holding the Notion integration token.
pub const TOKEN_VAR: &str = "NOTION_TOKEN";
/// Environment variable holding the tracing filter directive.
pub const LOG_VAR: &str = "LOG_LEVEL";

/// Startup configuration for the server process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Notion integration token sent as a bearer credential on every API call.
    pub notion_token: String,
    /// Tracing filter directive (e.g. "info", "notion_mcp=debug").
    pub log_level: String,
}

/// Errors from reading the environment at startup. Fatal: the process must
/// not start serving without a token.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("NOTION_TOKEN environment variable is not set")]
    MissingToken,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_values(std::env::var(TOKEN_VAR).ok(), std::env::var(LOG_VAR).ok())
    }

    fn from_values(token: Option<String>, log_level: Option<String>) -> Result<Self, ConfigError> {
        let notion_token = token
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;
        Ok(Self {
            notion_token,
            log_level: log_level.unwrap_or_else(|| "info".to_string()),
        })
    }
}
