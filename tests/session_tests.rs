use anyhow::Result;
use std::sync::Arc;
use teloxide::types::UserId;
use tokio::sync::Mutex;

use cvbot::session::{MenuChoice, RecognitionMode, SessionRegistry, SharedSessions};

/// Integration test for the shared registry the handlers clone around
#[tokio::test]
async fn test_shared_registry_mode_selection() -> Result<()> {
    let sessions: SharedSessions = Arc::new(Mutex::new(SessionRegistry::new()));

    {
        let mut registry = sessions.lock().await;
        let session = registry.find_or_create(UserId(1), "Ada");
        session.set_mode(RecognitionMode::Objects);
    }

    {
        let registry = sessions.lock().await;
        assert_eq!(
            registry.selected_mode(UserId(1)),
            Some(RecognitionMode::Objects)
        );
        assert_eq!(registry.selected_mode(UserId(2)), None);
    }

    Ok(())
}

/// Repeated selections are idempotent and later picks overwrite earlier ones
#[test]
fn test_set_mode_idempotent_and_overwriting() {
    let mut registry = SessionRegistry::new();
    let user = UserId(10);

    registry
        .find_or_create(user, "Ada")
        .set_mode(RecognitionMode::Text);
    registry
        .find_or_create(user, "Ada")
        .set_mode(RecognitionMode::Text);
    assert_eq!(registry.selected_mode(user), Some(RecognitionMode::Text));

    registry
        .find_or_create(user, "Ada")
        .set_mode(RecognitionMode::Nudity);
    assert_eq!(registry.selected_mode(user), Some(RecognitionMode::Nudity));
    assert_eq!(registry.len(), 1);
}

/// Lookup without creating returns nothing for unseen users
#[test]
fn test_get_without_create() {
    let registry = SessionRegistry::new();

    assert!(registry.get(UserId(99)).is_none());
    assert_eq!(registry.selected_mode(UserId(99)), None);
    assert!(registry.is_empty());
}

/// The display name recorded at first sight is kept afterwards
#[test]
fn test_display_name_recorded_once() {
    let mut registry = SessionRegistry::new();
    let user = UserId(5);

    registry.find_or_create(user, "First Name");
    let session = registry.find_or_create(user, "Changed Name");

    assert_eq!(session.display_name, "First Name");
    assert_eq!(session.user_id, user);
}

/// Every menu choice decodes back from its own callback code
#[test]
fn test_menu_choice_codes_round_trip() {
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
}

/// Mode codes decode to the matching recognition mode
#[test]
fn test_mode_codes_decode_to_modes() {
    assert_eq!(
        MenuChoice::parse("object_recognition"),
        Some(MenuChoice::Mode(RecognitionMode::Objects))
    );
    assert_eq!(
        MenuChoice::parse("text_recognition"),
        Some(MenuChoice::Mode(RecognitionMode::Text))
    );
    assert_eq!(
        MenuChoice::parse("nudity_recognition"),
        Some(MenuChoice::Mode(RecognitionMode::Nudity))
    );
    assert_eq!(
        MenuChoice::parse("personal_projective_equipment"),
        Some(MenuChoice::Mode(RecognitionMode::ProtectiveEquipment))
    );
}

/// Unknown callback codes decode to None
#[test]
fn test_unknown_codes_are_rejected() {
    assert_eq!(MenuChoice::parse(""), None);
    assert_eq!(MenuChoice::parse("crack_detection"), None);
    assert_eq!(MenuChoice::parse("OBJECT_RECOGNITION"), None);
}
