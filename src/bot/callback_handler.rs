//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::time::Duration;
use teloxide::prelude::*;
use tracing::{debug, warn};

// Import session types
use crate::session::{MenuChoice, SharedSessions};

// Import UI builder functions
use super::ui_builder::{
    create_main_menu_keyboard, CHOOSE_OPTION_PROMPT, SEND_IMAGE_PROMPT, TUTORIAL_PAGES,
};

/// Pause after each tutorial page
const TUTORIAL_PAGE_DELAY: Duration = Duration::from_secs(1);

/// Handle callback queries from the tutorial and main menu keyboards
pub async fn callback_handler(
    bot: Bot,
    q: teloxide::types::CallbackQuery,
    sessions: SharedSessions,
) -> Result<()> {
    debug!(user_id = %q.from.id, data = ?q.data, "Received callback query from user");

    let chat_id = match &q.message {
        Some(msg) => msg.chat().id,
        None => {
            // The originating message is gone; just clear the loading state
            warn!(user_id = %q.from.id, "Callback query without an attached message");
            bot.answer_callback_query(q.id).await?;
            return Ok(());
        }
    };

    let choice = q.data.as_deref().and_then(MenuChoice::parse);

    // Any recognized choice registers the user; mode picks also record the mode.
    // The lock is released before any message is sent.
    if let Some(choice) = choice {
        let mut registry = sessions.lock().await;
        let session = registry.find_or_create(q.from.id, &q.from.full_name());
        if let MenuChoice::Mode(mode) = choice {
            session.set_mode(mode);
            debug!(user_id = %q.from.id, mode = ?mode, "Recognition mode selected");
        }
    }

    match choice {
        Some(MenuChoice::ReadTutorial) => {
            for page in TUTORIAL_PAGES {
                bot.send_message(chat_id, page).await?;
                tokio::time::sleep(TUTORIAL_PAGE_DELAY).await;
            }
            bot.send_message(chat_id, CHOOSE_OPTION_PROMPT)
                .reply_markup(create_main_menu_keyboard())
                .await?;
        }
        Some(MenuChoice::SkipTutorial) => {
            bot.send_message(chat_id, CHOOSE_OPTION_PROMPT)
                .reply_markup(create_main_menu_keyboard())
                .await?;
        }
        Some(MenuChoice::Mode(_)) => {
            bot.send_message(chat_id, SEND_IMAGE_PROMPT).await?;
        }
        None => {
            debug!(user_id = %q.from.id, data = ?q.data, "Ignoring unknown callback data");
        }
    }

    // Answer the callback query to remove the loading state
    bot.answer_callback_query(q.id).await?;

    Ok(())
}
