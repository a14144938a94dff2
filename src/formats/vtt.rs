use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{normalize_newlines, split_blocks, SubtitleCodec, SubtitleFormat};
use crate::cue::Cue;
use crate::errors::SubtitleError;
use crate::timecode::{self, TimeStyle};

// @module: WebVTT codec

// @const: Leading voice span `<v Name>` or `<v.class Name>`
static VOICE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<v(?:\.[^\s>]+)*\s+([^>]+)>").unwrap()
});

/// WebVTT (`.vtt`) codec
#[derive(Debug, Clone, Copy, Default)]
pub struct VttCodec;

impl VttCodec {
    fn is_metadata_block(first_line: &str) -> bool {
        ["NOTE", "STYLE", "REGION"]
            .iter()
            .any(|prefix| first_line.starts_with(prefix))
    }

    fn is_metadata_line(line: &str) -> bool {
        line.contains("::") || line.starts_with("NOTE")
    }

    /// Split a leading voice span off the text
    fn take_voice(text: &str) -> (Option<String>, String) {
        match VOICE_REGEX.captures(text) {
            Some(caps) => {
                let speaker = caps[1].trim().to_string();
                let rest = text[caps[0].len()..].replacen("</v>", "", 1);
                (Some(speaker).filter(|s| !s.is_empty()), rest.trim().to_string())
            }
            None => (None, text.to_string()),
        }
    }
}

impl SubtitleCodec for VttCodec {
    fn format(&self) -> SubtitleFormat {
        SubtitleFormat::Vtt
    }

    fn decode(&self, text: &str) -> Result<Vec<Cue>, SubtitleError> {
        let normalized = normalize_newlines(text);
        let mut cues = Vec::new();

        for block in split_blocks(&normalized) {
            let lines: Vec<&str> = block.iter().map(|l| l.trim()).collect();
            if Self::is_metadata_block(lines[0]) {
                continue;
            }

            // Anything before the timing line is the header or a cue identifier
            let timing_at = match lines.iter().position(|l| l.contains("-->")) {
                Some(pos) => pos,
                None => continue,
            };

            let (start, end) = timecode::parse_range(lines[timing_at])?;
            let body: Vec<&str> = lines[timing_at + 1..]
                .iter()
                .copied()
                .filter(|l| !Self::is_metadata_line(l))
                .collect();
            let (speaker, text) = Self::take_voice(&body.join("\n"));

            let mut cue = Cue::new(cues.len() + 1, start, end, text);
            cue.speaker = speaker;
            cues.push(cue);
        }

        debug!("Decoded {} VTT cues", cues.len());
        Ok(cues)
    }

    fn encode(&self, cues: &[Cue]) -> String {
        let mut out = String::from("WEBVTT\n\n");
        for cue in cues {
            let text = match cue.speaker.as_deref() {
                Some(speaker) if !speaker.is_empty() => format!("<v {}>{}", speaker, cue.text),
                _ => cue.text.clone(),
            };
            out.push_str(&format!(
                "{} --> {}\n{}\n\n",
                timecode::format(cue.start, TimeStyle::Vtt),
                timecode::format(cue.end, TimeStyle::Vtt),
                text
            ));
        }
        out
    }
}
