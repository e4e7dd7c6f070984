//! UI Builder module for creating keyboards and prompt texts

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::session::{MenuChoice, RecognitionMode};

/// Prompt shown above the main menu keyboard
pub const CHOOSE_OPTION_PROMPT: &str = "Choose one option:";
/// Prompt sent after a recognition mode is selected
pub const SEND_IMAGE_PROMPT: &str = "Send image to recognize";
/// Prompt shown with the tutorial yes/no keyboard
pub const TUTORIAL_PROMPT: &str = "Read tutorial?";

/// Tutorial pages, sent in order with a pause after each
pub const TUTORIAL_PAGES: [&str; 2] = [
    "Send photo without compression as a file",
    "In .png or .jpg formats",
];

/// Main menu rows, one recognition mode per row
pub const MENU_MODES: [RecognitionMode; 4] = [
    RecognitionMode::Objects,
    RecognitionMode::Text,
    RecognitionMode::Nudity,
    RecognitionMode::ProtectiveEquipment,
];

/// Single-button keyboard row
fn keyboard_row(text: &str, code: &str) -> Vec<InlineKeyboardButton> {
    vec![InlineKeyboardButton::callback(
        text.to_string(),
        code.to_string(),
    )]
}

/// Create the yes/no keyboard attached to the tutorial prompt
pub fn create_tutorial_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        keyboard_row("Read tutorial", MenuChoice::ReadTutorial.callback_code()),
        keyboard_row("Skip tutorial", MenuChoice::SkipTutorial.callback_code()),
    ])
}

/// Create the four-row main menu keyboard
pub fn create_main_menu_keyboard() -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = MENU_MODES
        .iter()
        .map(|mode| keyboard_row(mode.menu_label(), mode.callback_code()))
        .collect();

    InlineKeyboardMarkup::new(rows)
}
