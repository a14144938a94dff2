/*!
 * Error types for the subedit library.
 *
 * This module contains custom error types for the different parts of the
 * library, using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors raised by time codes, subtitle codecs and the cue store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubtitleError {
    /// Malformed or unrecognized time code or text structure
    #[error("Parse error: {0}")]
    Parse(String),

    /// None of the known subtitle grammars matched the input
    #[error("Unrecognized subtitle format: no SRT, VTT or ASS cues found")]
    UnrecognizedFormat,

    /// An index-based store operation referenced a missing cue
    #[error("Cue index {index} is out of range (store has {len} cues)")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Store length at the time of the call
        len: usize,
    },

    /// A time value that can never be stored (negative, NaN or infinite)
    #[error("Invalid time value: {0}")]
    InvalidTime(String),
}

impl SubtitleError {
    /// Shorthand for a parse error with a formatted message
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }
}

/// Errors that can occur on the collaboration channel
#[derive(Error, Debug)]
pub enum SyncError {
    /// The peer went away or the channel was shut down
    #[error("Sync channel closed")]
    ChannelClosed,

    /// Sending a message failed
    #[error("Failed to send sync message: {0}")]
    Send(String),

    /// An inbound message could not be decoded
    #[error("Failed to decode sync message: {0}")]
    Decode(#[from] serde_json::Error),

    /// The broadcast debounce window is outside the allowed range
    #[error("Debounce of {millis} ms is outside {min}..={max} ms")]
    InvalidDebounce { millis: u64, min: u64, max: u64 },
}

/// Errors that can occur while persisting or restoring autosave snapshots
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Underlying SQLite failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Snapshot payload could not be (de)serialized
    #[error("Snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File system failure while preparing the database location
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection mutex was poisoned
    #[error("Failed to acquire database lock: {0}")]
    Lock(String),

    /// The on-disk schema cannot be brought up to date
    #[error("Schema error: {0}")]
    Schema(String),

    /// A stored timestamp was not valid RFC 3339
    #[error("Invalid stored timestamp: {0}")]
    Timestamp(String),

    /// No usable data directory could be determined
    #[error("Could not determine data directory")]
    NoDataDir,
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from the sync session
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Error from autosave persistence
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
