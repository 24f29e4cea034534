use crate::model::ConfigError;
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub telegram_bot_token: String,
    pub telegram_channel_id: String,
    /// Optional here; the insight stage also accepts OPENAI_API_KEY from the
    /// environment and fails on its own when neither is set.
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_mining_limit")]
    pub mining_limit: usize,
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,
}

fn default_mining_limit() -> usize {
    40
}

fn default_check_interval() -> u64 {
    21_600
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}
