/*!
 * Write-only export formats.
 *
 * Besides the three subtitle formats, cues can be exported as a plain-text
 * listing, a CSV sheet or a JSON array.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::SubtitleFormat;
use crate::cue::Cue;
use crate::errors::SubtitleError;
use crate::timecode::{self, TimeStyle};

/// Plain text: `start - end` followed by the text, blocks separated by a blank line
pub fn export_txt(cues: &[Cue]) -> String {
    cues.iter()
        .map(|cue| {
            format!(
                "{} - {}\n{}\n",
                timecode::format(cue.start, TimeStyle::Srt),
                timecode::format(cue.end, TimeStyle::Srt),
                cue.display_text()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// CSV with a `Start,End,Duration,Text` header; quotes inside text are doubled
pub fn export_csv(cues: &[Cue]) -> String {
    let mut out = String::from("Start,End,Duration,Text\n");
    for cue in cues {
        out.push_str(&format!(
            "{},{},{:.3},\"{}\"\n",
            timecode::format(cue.start, TimeStyle::Srt),
            timecode::format(cue.end, TimeStyle::Srt),
            cue.duration(),
            cue.display_text().replace('"', "\"\"")
        ));
    }
    out
}

/// Pretty-printed JSON array of cues
pub fn export_json(cues: &[Cue]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(cues)
}

/// Any format cues can be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Srt,
    Vtt,
    Ass,
    Txt,
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Vtt => "vtt",
            Self::Ass => "ass",
            Self::Txt => "txt",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// The subtitle format behind this export, if it is one
    pub fn subtitle_format(&self) -> Option<SubtitleFormat> {
        match self {
            Self::Srt => Some(SubtitleFormat::Srt),
            Self::Vtt => Some(SubtitleFormat::Vtt),
            Self::Ass => Some(SubtitleFormat::Ass),
            _ => None,
        }
    }

    /// Render cues in this format
    pub fn render(&self, cues: &[Cue]) -> serde_json::Result<String> {
        match self {
            Self::Txt => Ok(export_txt(cues)),
            Self::Csv => Ok(export_csv(cues)),
            Self::Json => export_json(cues),
            Self::Srt => Ok(SubtitleFormat::Srt.codec().encode(cues)),
            Self::Vtt => Ok(SubtitleFormat::Vtt.codec().encode(cues)),
            Self::Ass => Ok(SubtitleFormat::Ass.codec().encode(cues)),
        }
    }
}

impl From<SubtitleFormat> for ExportFormat {
    fn from(format: SubtitleFormat) -> Self {
        match format {
            SubtitleFormat::Srt => Self::Srt,
            SubtitleFormat::Vtt => Self::Vtt,
            SubtitleFormat::Ass => Self::Ass,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = SubtitleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "srt" => Ok(Self::Srt),
            "vtt" => Ok(Self::Vtt),
            "ass" | "ssa" => Ok(Self::Ass),
            "txt" => Ok(Self::Txt),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(SubtitleError::parse(format!("unknown export format '{}'", other))),
        }
    }
}
