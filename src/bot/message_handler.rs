//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use tempfile::NamedTempFile;
use tracing::{debug, error, info};

// Import detection and rendering services
use crate::rekognition::{RekognitionError, RekognitionService};
use crate::render::{Annotation, Renderer};

// Import session types
use crate::session::{RecognitionMode, SharedSessions};

// Import UI builder functions
use super::ui_builder::{
    create_main_menu_keyboard, create_tutorial_keyboard, CHOOSE_OPTION_PROMPT, TUTORIAL_PROMPT,
};

/// Pause after each moderation label message
const MODERATION_LABEL_DELAY: Duration = Duration::from_millis(50);

/// File name given to the annotated image sent back to the chat
const ANNOTATED_FILE_NAME: &str = "annotated.png";

pub async fn download_file(bot: &Bot, file_id: teloxide::types::FileId) -> Result<String> {
    let file = bot.get_file(file_id).await?;
    let file_path = file.path;
    let url = format!(
        "https://api.telegram.org/file/bot{}/{}",
        bot.token(),
        file_path
    );

    let response = reqwest::get(&url).await?;
    let bytes = response.bytes().await?;

    let mut temp_file = NamedTempFile::new()?;
    temp_file.as_file_mut().write_all(&bytes)?;
    let path = temp_file.path().to_string_lossy().to_string();

    // Return the path and let the caller delete the file when done.
    // Dropping the NamedTempFile would remove it, so leak the handle here.
    std::mem::forget(temp_file);

    Ok(path)
}

async fn handle_text_message(bot: &Bot, msg: &Message) -> Result<()> {
    if let Some(text) = msg.text() {
        debug!(user_id = %msg.chat.id, message_length = text.len(), "Received text message from user");

        // Handle /start command
        if text == "/start" {
            bot.send_message(msg.chat.id, TUTORIAL_PROMPT)
                .reply_markup(create_tutorial_keyboard())
                .await?;
        } else {
            debug!(user_id = %msg.chat.id, "Ignoring text message without a known command");
        }
    }
    Ok(())
}

async fn handle_document_message(
    bot: &Bot,
    msg: &Message,
    sessions: &SharedSessions,
    vision: &RekognitionService,
    renderer: &Renderer,
) -> Result<()> {
    let doc = match msg.document() {
        Some(doc) => doc,
        None => return Ok(()),
    };

    if let Some(mime_type) = &doc.mime_type {
        if !mime_type.to_string().starts_with("image/") {
            debug!(user_id = %msg.chat.id, mime_type = %mime_type, "Skipping non-image document");
            return Ok(());
        }
    }

    let user_id = match msg.from.as_ref() {
        Some(user) => user.id,
        None => {
            debug!(user_id = %msg.chat.id, "Document without a sender, skipping");
            return Ok(());
        }
    };

    let mode = {
        let registry = sessions.lock().await;
        registry.selected_mode(user_id)
    };

    let mode = match mode {
        Some(mode) => mode,
        None => {
            // The user never picked a recognition mode; offer the menu instead
            debug!(user_id = %user_id, "Upload without a selected recognition mode");
            bot.send_message(msg.chat.id, CHOOSE_OPTION_PROMPT)
                .reply_markup(create_main_menu_keyboard())
                .await?;
            return Ok(());
        }
    };

    let temp_path = match download_file(bot, doc.file.id.clone()).await {
        Ok(path) => {
            debug!(user_id = %user_id, temp_path = %path, "Image downloaded successfully");
            path
        }
        Err(e) => {
            error!(user_id = %user_id, error = %e, "Failed to download image for user");
            return Err(e);
        }
    };

    let result = run_recognition(bot, msg.chat.id, mode, &temp_path, vision, renderer).await;

    // Always clean up the temporary file
    if let Err(cleanup_err) = std::fs::remove_file(&temp_path) {
        error!(temp_path = %temp_path, error = %cleanup_err, "Failed to clean up temporary file");
    } else {
        debug!(temp_path = %temp_path, "Temporary file cleaned up successfully");
    }

    result
}

async fn run_recognition(
    bot: &Bot,
    chat_id: ChatId,
    mode: RecognitionMode,
    temp_path: &str,
    vision: &RekognitionService,
    renderer: &Renderer,
) -> Result<()> {
    let image_bytes = tokio::fs::read(temp_path).await?;

    match mode {
        RecognitionMode::Objects => {
            let result = vision.detect_objects(&image_bytes).await;
            send_annotated_image(bot, chat_id, renderer, &image_bytes, "objects", result).await?;
        }
        RecognitionMode::Text => {
            let result = vision.detect_text(&image_bytes).await;
            send_annotated_image(bot, chat_id, renderer, &image_bytes, "text", result).await?;
        }
        RecognitionMode::ProtectiveEquipment => {
            let result = vision.detect_protective_equipment(&image_bytes).await;
            send_annotated_image(bot, chat_id, renderer, &image_bytes, "ppe", result).await?;
        }
        RecognitionMode::Nudity => {
            let labels = match vision.detect_moderation_labels(&image_bytes).await {
                Ok(labels) => labels,
                Err(e) => {
                    error!(user_id = %chat_id, error = %e, "Moderation detection failed");
                    return Ok(());
                }
            };

            info!(user_id = %chat_id, labels = labels.len(), "Moderation detection completed");

            // One message per label; this flow ends in text, without the menu
            for label in labels {
                bot.send_message(chat_id, label).await?;
                tokio::time::sleep(MODERATION_LABEL_DELAY).await;
            }
        }
    }

    Ok(())
}

/// Render the detected boxes over the source image, reply with the result,
/// and bring the menu back for the next round
async fn send_annotated_image(
    bot: &Bot,
    chat_id: ChatId,
    renderer: &Renderer,
    image_bytes: &[u8],
    category: &str,
    result: Result<Vec<Annotation>, RekognitionError>,
) -> Result<()> {
    let annotations = match result {
        Ok(annotations) => annotations,
        Err(e) => {
            error!(user_id = %chat_id, category = %category, error = %e, "Detection request failed");
            return Ok(());
        }
    };

    info!(user_id = %chat_id, category = %category, boxes = annotations.len(), "Detection completed");

    let annotated = match renderer.annotate(image_bytes, &annotations) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(user_id = %chat_id, error = %e, "Failed to render annotations");
            return Ok(());
        }
    };

    bot.send_photo(
        chat_id,
        InputFile::memory(annotated).file_name(ANNOTATED_FILE_NAME),
    )
    .await?;

    bot.send_message(chat_id, CHOOSE_OPTION_PROMPT)
        .reply_markup(create_main_menu_keyboard())
        .await?;

    Ok(())
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    sessions: SharedSessions,
    vision: RekognitionService,
    renderer: Arc<Renderer>,
) -> Result<()> {
    if msg.text().is_some() {
        handle_text_message(&bot, &msg).await?;
    } else if msg.document().is_some() {
        handle_document_message(&bot, &msg, &sessions, &vision, &renderer).await?;
    } else {
        debug!(user_id = %msg.chat.id, "Ignoring unsupported message type");
    }

    Ok(())
}
