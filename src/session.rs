//! Session module for tracking which recognition mode each user selected.

use std::collections::HashMap;
use std::sync::Arc;
use teloxide::types::UserId;
use tokio::sync::Mutex;

/// Recognition categories the bot can run on an uploaded image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionMode {
    Objects,
    Text,
    Nudity,
    ProtectiveEquipment,
}

impl RecognitionMode {
    /// Opaque code carried in the menu button callback data
    pub fn callback_code(self) -> &'static str {
        match self {
            RecognitionMode::Objects => "object_recognition",
            RecognitionMode::Text => "text_recognition",
            RecognitionMode::Nudity => "nudity_recognition",
            RecognitionMode::ProtectiveEquipment => "personal_projective_equipment",
        }
    }

    /// Button label shown in the main menu
    pub fn menu_label(self) -> &'static str {
        match self {
            RecognitionMode::Objects => "Object recognition",
            RecognitionMode::Text => "Text recognition",
            RecognitionMode::Nudity => "Nudity recognition",
            RecognitionMode::ProtectiveEquipment => "Personal Projective Equipment",
        }
    }
}

/// Every option reachable from an inline keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    ReadTutorial,
    SkipTutorial,
    Mode(RecognitionMode),
}

impl MenuChoice {
    /// Decode callback data; unknown codes decode to None and are ignored
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "read_tutorial" => Some(MenuChoice::ReadTutorial),
            "skip_tutorial" => Some(MenuChoice::SkipTutorial),
            "object_recognition" => Some(MenuChoice::Mode(RecognitionMode::Objects)),
            "text_recognition" => Some(MenuChoice::Mode(RecognitionMode::Text)),
            "nudity_recognition" => Some(MenuChoice::Mode(RecognitionMode::Nudity)),
            "personal_projective_equipment" => {
                Some(MenuChoice::Mode(RecognitionMode::ProtectiveEquipment))
            }
            _ => None,
        }
    }

    /// Code placed in the callback data of the matching button
    pub fn callback_code(self) -> &'static str {
        match self {
            MenuChoice::ReadTutorial => "read_tutorial",
            MenuChoice::SkipTutorial => "skip_tutorial",
            MenuChoice::Mode(mode) => mode.callback_code(),
        }
    }
}

/// State kept for one Telegram user across updates
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: UserId,
    pub display_name: String,
    pub mode: Option<RecognitionMode>,
}

impl Session {
    fn new(user_id: UserId, display_name: String) -> Self {
        Self {
            user_id,
            display_name,
            mode: None,
        }
    }

    /// Overwrites the previous selection; repeating a selection changes nothing
    pub fn set_mode(&mut self, mode: RecognitionMode) {
        self.mode = Some(mode);
    }
}

/// All live sessions keyed by user id. Sessions are never removed and last
/// for the process lifetime.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<UserId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the user's session, creating an empty-mode one on first sight
    pub fn find_or_create(&mut self, user_id: UserId, display_name: &str) -> &mut Session {
        self.sessions
            .entry(user_id)
            .or_insert_with(|| Session::new(user_id, display_name.to_string()))
    }

    /// Lookup without creating; uploads from users who skipped the menu land here
    pub fn get(&self, user_id: UserId) -> Option<&Session> {
        self.sessions.get(&user_id)
    }

    /// The mode the user last picked from the menu, if any
    pub fn selected_mode(&self, user_id: UserId) -> Option<RecognitionMode> {
        self.sessions.get(&user_id).and_then(|session| session.mode)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Shared handle injected into the teloxide handler tree
pub type SharedSessions = Arc<Mutex<SessionRegistry>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_or_create_reuses_session() {
        let mut registry = SessionRegistry::new();
        let user = UserId(42);

        registry
            .find_or_create(user, "Alice")
            .set_mode(RecognitionMode::Text);

        // Second lookup must return the same session, mode intact
        let session = registry.find_or_create(user, "Alice");
        assert_eq!(session.mode, Some(RecognitionMode::Text));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_does_not_create() {
        let registry = SessionRegistry::new();
        assert!(registry.get(UserId(7)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_choice_codes_round_trip() {
        let choices = [
            MenuChoice::ReadTutorial,
            MenuChoice::SkipTutorial,
            MenuChoice::Mode(RecognitionMode::Objects),
            MenuChoice::Mode(RecognitionMode::Text),
            MenuChoice::Mode(RecognitionMode::Nudity),
            MenuChoice::Mode(RecognitionMode::ProtectiveEquipment),
        ];

        for choice in choices {
            assert_eq!(MenuChoice::parse(choice.callback_code()), Some(choice));
        }

        assert_eq!(MenuChoice::parse("crack_detection"), None);
    }
}
