/*!
 * Subtitle file formats.
 *
 * Each supported format has a codec implementing [`SubtitleCodec`]:
 * - `srt`: SubRip
 * - `vtt`: WebVTT
 * - `ass`: Advanced SubStation Alpha (`.ass` and `.ssa`)
 *
 * The `export` module adds write-only formats (plain text, CSV, JSON).
 */

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::cue::Cue;
use crate::errors::SubtitleError;

pub mod ass;
pub mod export;
pub mod srt;
pub mod vtt;

pub use ass::AssCodec;
pub use export::ExportFormat;
pub use srt::SrtCodec;
pub use vtt::VttCodec;

/// Reads and writes one subtitle text format
pub trait SubtitleCodec {
    /// The format this codec handles
    fn format(&self) -> SubtitleFormat;

    /// Parse a whole document into cues
    fn decode(&self, text: &str) -> Result<Vec<Cue>, SubtitleError>;

    /// Serialize cues into a whole document
    fn encode(&self, cues: &[Cue]) -> String;
}

/// Supported subtitle formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    Srt,
    Vtt,
    Ass,
}

impl SubtitleFormat {
    /// Detection order used by [`detect_and_decode`]
    pub const DETECTION_ORDER: [SubtitleFormat; 3] =
        [SubtitleFormat::Srt, SubtitleFormat::Vtt, SubtitleFormat::Ass];

    /// Canonical file extension
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Vtt => "vtt",
            Self::Ass => "ass",
        }
    }

    /// Format for a file extension (case-insensitive, with or without the dot)
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.').to_lowercase().as_str() {
            "srt" => Some(Self::Srt),
            "vtt" => Some(Self::Vtt),
            "ass" | "ssa" => Some(Self::Ass),
            _ => None,
        }
    }

    /// Format for a path, judged by its extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Default codec for this format
    pub fn codec(&self) -> Box<dyn SubtitleCodec + Send + Sync> {
        match self {
            Self::Srt => Box::new(SrtCodec),
            Self::Vtt => Box::new(VttCodec),
            Self::Ass => Box::new(AssCodec::new()),
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for SubtitleFormat {
    type Err = SubtitleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s)
            .ok_or_else(|| SubtitleError::parse(format!("unknown subtitle format '{}'", s)))
    }
}

/// Try each codec in detection order and return the first non-empty result.
///
/// Codec errors count as "did not match".
pub fn detect_and_decode(text: &str) -> Result<(SubtitleFormat, Vec<Cue>), SubtitleError> {
    for format in SubtitleFormat::DETECTION_ORDER {
        match format.codec().decode(text) {
            Ok(cues) if !cues.is_empty() => {
                debug!("Detected {} input with {} cues", format, cues.len());
                return Ok((format, cues));
            }
            Ok(_) => debug!("{} codec found no cues", format),
            Err(e) => debug!("{} codec rejected input: {}", format, e),
        }
    }
    Err(SubtitleError::UnrecognizedFormat)
}

/// Decode text in whichever supported format it is written in
pub fn decode_auto(text: &str) -> Result<Vec<Cue>, SubtitleError> {
    detect_and_decode(text).map(|(_, cues)| cues)
}

/// Strip a UTF-8 BOM and normalize line endings to `\n`
pub(crate) fn normalize_newlines(text: &str) -> String {
    text.trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

/// Split text into blocks of non-blank lines
pub(crate) fn split_blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}
