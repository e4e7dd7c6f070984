use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cvbot::bot;
use cvbot::config::Config;
use cvbot::rekognition::RekognitionService;
use cvbot::render::{Renderer, FONT_PATH};
use cvbot::session::SessionRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    info!("Starting CV recognition Telegram bot");

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = Config::from_env()?;

    // Initialize the bot
    let bot = Bot::new(config.telegram_token.clone());

    let me = bot.get_me().await?;
    info!("Authorized on account {}", me.username());

    // Shared services: the AWS client, the drawing font, and the session registry
    let vision = RekognitionService::from_config(&config).await;
    let renderer = Arc::new(Renderer::from_font_file(FONT_PATH));
    let sessions = Arc::new(Mutex::new(SessionRegistry::new()));

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(bot::callback_handler))
        .branch(Update::filter_message().endpoint(bot::message_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![sessions, vision, renderer])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
