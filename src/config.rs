//! Startup configuration from the environment.

use crate::extractor::ExtractorError;
use std::env;
use url::Url;

/// Environment variable holding the Telegram bot token. Required.
const TOKEN_VAR: &str = "BOT_TOKEN";
/// Optional override for the results endpoint.
const RESULTS_URL_VAR: &str = "RESULTS_URL";

/// Process-level configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub results_url: Option<Url>,
}

impl BotConfig {
    /// Reads configuration from the environment. The bot token is mandatory;
    /// startup fails without it.
    pub fn from_env() -> Result<Self, ExtractorError> {
        let token = env::var(TOKEN_VAR).map_err(|_| ExtractorError::Config {
            message: format!("{TOKEN_VAR} is not set"),
        })?;

        let results_url = match env::var(RESULTS_URL_VAR) {
            Ok(raw) => Some(Url::parse(&raw).map_err(|e| ExtractorError::Config {
                message: format!("{RESULTS_URL_VAR} is not a valid URL: {e}"),
            })?),
            Err(_) => None,
        };

        Ok(Self { token, results_url })
    }
}
