/*!
 * # subedit - subtitle authoring core
 *
 * A Rust library for editing timed subtitle cues and keeping two editors in
 * sync over a message channel.
 *
 * ## Features
 *
 * - Ordered cue store with timing-aware edit operations
 * - SRT, WebVTT and ASS reading and writing, with format auto-detection
 * - Overlap detection and resolution
 * - Plain text, CSV and JSON export
 * - Host/guest collaboration with echo suppression and debounced broadcast
 * - Undo history and SQLite-backed autosave
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `timecode`: Time value formatting and parsing
 * - `cue`: The cue record and its fields
 * - `cue_store`: The ordered, observable cue collection
 * - `overlap`: Overlap detection and resolution
 * - `text_tools`: Search, replace, speakers and inline styling
 * - `formats`: Subtitle codecs and exporters:
 *   - `formats::srt`: SubRip
 *   - `formats::vtt`: WebVTT
 *   - `formats::ass`: Advanced SubStation Alpha
 *   - `formats::export`: Write-only text, CSV and JSON
 * - `sync`: Collaboration messages, channels and the session loop
 * - `analysis`: Statistics and readability
 * - `history`: Undo/redo snapshots
 * - `autosave`: Periodic snapshot persistence
 * - `app_config`: Configuration management
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod analysis;
pub mod app_config;
pub mod autosave;
pub mod cue;
pub mod cue_store;
pub mod errors;
pub mod file_utils;
pub mod formats;
pub mod history;
pub mod overlap;
pub mod sync;
pub mod text_tools;
pub mod timecode;

// Re-export main types for easier usage
pub use app_config::Config;
pub use cue::{Cue, CueField, CuePosition};
pub use cue_store::{CueStore, StoreChange, TimingRules};
pub use errors::{AppError, SubtitleError};
pub use formats::{ExportFormat, SubtitleCodec, SubtitleFormat};
pub use overlap::{Overlap, OverlapResolver};
pub use sync::{ConnectionState, SessionRole, SyncMessage, SyncReconciler, SyncSession};
pub use timecode::TimeStyle;
