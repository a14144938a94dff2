use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{normalize_newlines, split_blocks, SubtitleCodec, SubtitleFormat};
use crate::cue::Cue;
use crate::errors::SubtitleError;
use crate::timecode::{self, TimeStyle};

// @module: SubRip codec

// @const: SRT timestamp line, comma separator only
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+:\d{2}:\d{2},\d{1,3})\s*-->\s*(\d+:\d{2}:\d{2},\d{1,3})(?:\s.*)?$").unwrap()
});

/// SubRip (`.srt`) codec
#[derive(Debug, Clone, Copy, Default)]
pub struct SrtCodec;

impl SrtCodec {
    fn parse_timing(line: &str, block_number: usize) -> Result<(f64, f64), SubtitleError> {
        let caps = TIMESTAMP_REGEX.captures(line).ok_or_else(|| {
            SubtitleError::parse(format!("malformed SRT timing in block {}: '{}'", block_number, line))
        })?;
        Ok((timecode::parse(&caps[1])?, timecode::parse(&caps[2])?))
    }
}

impl SubtitleCodec for SrtCodec {
    fn format(&self) -> SubtitleFormat {
        SubtitleFormat::Srt
    }

    fn decode(&self, text: &str) -> Result<Vec<Cue>, SubtitleError> {
        let normalized = normalize_newlines(text);
        let mut cues = Vec::new();

        for (block_index, block) in split_blocks(&normalized).into_iter().enumerate() {
            let lines: Vec<&str> = block.iter().map(|l| l.trim()).collect();

            // Index line is optional; the timing line is whichever comes first with an arrow
            let timing_at = match lines.iter().take(2).position(|l| l.contains("-->")) {
                Some(pos) => pos,
                None => {
                    warn!("Skipping SRT block {} without a timing line", block_index + 1);
                    continue;
                }
            };

            let (start, end) = Self::parse_timing(lines[timing_at], block_index + 1)?;
            let id = if timing_at == 1 {
                lines[0].parse::<usize>().unwrap_or(cues.len() + 1)
            } else {
                cues.len() + 1
            };
            let text = lines[timing_at + 1..].join("\n");

            cues.push(Cue::new(id, start, end, text));
        }

        debug!("Decoded {} SRT cues", cues.len());
        Ok(cues)
    }

    fn encode(&self, cues: &[Cue]) -> String {
        let mut out = String::new();
        for (i, cue) in cues.iter().enumerate() {
            out.push_str(&format!(
                "{}\n{} --> {}\n{}\n\n",
                i + 1,
                timecode::format(cue.start, TimeStyle::Srt),
                timecode::format(cue.end, TimeStyle::Srt),
                cue.display_text()
            ));
        }
        out
    }
}
