/*!
 * Tests for error types and conversions
 */

use subedit::errors::{AppError, PersistenceError, SubtitleError, SyncError};

/// Test the human-readable messages
#[test]
fn test_display_shouldDescribeError() {
    assert_eq!(
        SubtitleError::IndexOutOfRange { index: 4, len: 2 }.to_string(),
        "Cue index 4 is out of range (store has 2 cues)"
    );
    assert!(SubtitleError::parse("bad").to_string().contains("bad"));
    assert_eq!(SyncError::ChannelClosed.to_string(), "Sync channel closed");
}

/// Test conversion of library errors into the application error
#[test]
fn test_from_shouldWrapLibraryErrors() {
    let app: AppError = SubtitleError::UnrecognizedFormat.into();
    assert!(matches!(app, AppError::Subtitle(SubtitleError::UnrecognizedFormat)));

    let app: AppError = PersistenceError::NoDataDir.into();
    assert!(matches!(app, AppError::Persistence(_)));

    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let sync: SyncError = json_error.into();
    assert!(matches!(sync, SyncError::Decode(_)));
}

/// Test conversions from std and anyhow errors
#[test]
fn test_from_withIoAndAnyhow_shouldMapVariants() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.srt");
    let app: AppError = io.into();
    assert!(app.to_string().contains("missing.srt"));

    let app: AppError = anyhow::anyhow!("something odd").into();
    assert!(app.to_string().contains("something odd"));
}
