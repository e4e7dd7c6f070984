//! Process configuration loaded from the environment.

use anyhow::{Context, Result};
use std::env;

/// Everything the bot needs from the environment, read once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot API token
    pub telegram_token: String,
    /// AWS access key for the Rekognition client
    pub aws_access_key_id: String,
    /// AWS secret key for the Rekognition client
    pub aws_secret_access_key: String,
    /// AWS region the Rekognition client talks to
    pub aws_region: String,
}

impl Config {
    /// Read all required variables; a missing one fails startup with its name
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            telegram_token: env::var("TELEGRAM_BOT_TOKEN")
                .context("TELEGRAM_BOT_TOKEN must be set")?,
            aws_access_key_id: env::var("AWS_ACCESS_KEY_ID")
                .context("AWS_ACCESS_KEY_ID must be set")?,
            aws_secret_access_key: env::var("AWS_SECRET_ACCESS_KEY")
                .context("AWS_SECRET_ACCESS_KEY must be set")?,
            aws_region: env::var("AWS_REGION").context("AWS_REGION must be set")?,
        })
    }
}
