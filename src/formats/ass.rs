use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{normalize_newlines, SubtitleCodec, SubtitleFormat};
use crate::cue::{Cue, CuePosition};
use crate::errors::SubtitleError;
use crate::text_tools;
use crate::timecode::{self, TimeStyle};

// @module: Advanced SubStation Alpha codec

// @const: `\anN` alignment tag
static ALIGNMENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\an([1-9])").unwrap()
});

const STYLES_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";

const DEFAULT_STYLE: &str = "Style: Default,Arial,20,&H00FFFFFF,&H000000FF,&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,2,2,2,10,10,10,1";

const EVENTS_FORMAT: &str = "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

/// Column positions of the `[Events]` fields we read
#[derive(Debug, Clone, Copy, PartialEq)]
struct EventLayout {
    field_count: usize,
    start: usize,
    end: usize,
    name: Option<usize>,
    text: usize,
}

impl Default for EventLayout {
    fn default() -> Self {
        Self {
            field_count: 10,
            start: 1,
            end: 2,
            name: Some(4),
            text: 9,
        }
    }
}

impl EventLayout {
    /// Read a `Format:` line. Text must be the last column for commas to survive.
    fn from_format_line(spec: &str) -> Option<Self> {
        let columns: Vec<String> = spec.split(',').map(|c| c.trim().to_lowercase()).collect();
        let find = |name: &str| columns.iter().position(|c| c == name);

        let text = find("text")?;
        if text != columns.len() - 1 {
            return None;
        }

        Some(Self {
            field_count: columns.len(),
            start: find("start")?,
            end: find("end")?,
            name: find("name"),
            text,
        })
    }
}

/// ASS/SSA codec
#[derive(Debug, Clone)]
pub struct AssCodec {
    plain_text: bool,
    title: String,
}

impl AssCodec {
    /// Codec that keeps `{...}` override blocks in cue text
    pub fn new() -> Self {
        Self {
            plain_text: false,
            title: "Exported subtitles".to_string(),
        }
    }

    /// Codec that strips every override block on decode
    pub fn plain_text() -> Self {
        Self {
            plain_text: true,
            ..Self::new()
        }
    }

    /// Set the `Title:` written to `[Script Info]`
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    fn decode_text(&self, raw: &str) -> (String, Option<CuePosition>) {
        let mut text = raw.to_string();
        let mut position = None;

        // Alignment only counts when it sits in the leading override block
        if text.starts_with('{') {
            if let Some(close) = text.find('}') {
                let block = &text[1..close];
                if let Some(caps) = ALIGNMENT_REGEX.captures(block) {
                    let digit = caps[1].parse::<u8>().unwrap_or(2);
                    position = CuePosition::from_ass_alignment(digit);
                    let remaining = ALIGNMENT_REGEX.replace(block, "").to_string();
                    text = if remaining.is_empty() {
                        text[close + 1..].to_string()
                    } else {
                        format!("{{{}}}{}", remaining, &text[close + 1..])
                    };
                }
            }
        }

        if self.plain_text {
            text = text_tools::strip_formatting(&text);
        }

        let text = text.replace("\\N", "\n").replace("\\n", "\n").replace("\\h", " ");
        (text.trim().to_string(), position)
    }

    fn encode_text(cue: &Cue) -> String {
        let mut text = cue.text.replace('\n', "\\N");
        if let Some(position) = cue.position {
            text = format!("{{\\an{}}}{}", position.ass_alignment(), text);
        }
        text
    }
}

impl Default for AssCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl SubtitleCodec for AssCodec {
    fn format(&self) -> SubtitleFormat {
        SubtitleFormat::Ass
    }

    fn decode(&self, text: &str) -> Result<Vec<Cue>, SubtitleError> {
        let normalized = normalize_newlines(text);
        let mut cues = Vec::new();
        let mut in_events = false;
        let mut layout = EventLayout::default();

        for (line_number, line) in normalized.lines().enumerate() {
            let trimmed = line.trim();

            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                in_events = trimmed.eq_ignore_ascii_case("[events]");
                continue;
            }
            if !in_events {
                continue;
            }

            if let Some(spec) = trimmed.strip_prefix("Format:") {
                match EventLayout::from_format_line(spec) {
                    Some(parsed) => layout = parsed,
                    None => warn!("Ignoring unusable ASS format line {}: {}", line_number + 1, trimmed),
                }
                continue;
            }

            let Some(body) = trimmed.strip_prefix("Dialogue:") else {
                continue;
            };

            let fields: Vec<&str> = body.trim_start().splitn(layout.field_count, ',').collect();
            if fields.len() < layout.field_count {
                return Err(SubtitleError::parse(format!(
                    "ASS dialogue line {} has {} fields, expected {}",
                    line_number + 1,
                    fields.len(),
                    layout.field_count
                )));
            }

            let start = timecode::parse_ass(fields[layout.start])?;
            let end = timecode::parse_ass(fields[layout.end])?;
            let (text, position) = self.decode_text(fields[layout.text]);

            let mut cue = Cue::new(cues.len() + 1, start, end, text);
            cue.speaker = layout
                .name
                .map(|i| fields[i].trim())
                .filter(|name| !name.is_empty())
                .map(str::to_string);
            cue.position = position;
            cues.push(cue);
        }

        debug!("Decoded {} ASS cues", cues.len());
        Ok(cues)
    }

    fn encode(&self, cues: &[Cue]) -> String {
        let mut out = String::new();

        out.push_str("[Script Info]\n");
        out.push_str(&format!("Title: {}\n", self.title));
        out.push_str("ScriptType: v4.00+\n");
        out.push_str("WrapStyle: 0\n");
        out.push_str("PlayResX: 384\n");
        out.push_str("PlayResY: 288\n\n");

        out.push_str("[V4+ Styles]\n");
        out.push_str(STYLES_FORMAT);
        out.push('\n');
        out.push_str(DEFAULT_STYLE);
        out.push_str("\n\n");

        out.push_str("[Events]\n");
        out.push_str(EVENTS_FORMAT);
        out.push('\n');

        for cue in cues {
            let name = cue.speaker.as_deref().unwrap_or("").replace(',', "");
            out.push_str(&format!(
                "Dialogue: 0,{},{},Default,{},0,0,0,,{}\n",
                timecode::format(cue.start, TimeStyle::Ass),
                timecode::format(cue.end, TimeStyle::Ass),
                name,
                Self::encode_text(cue)
            ));
        }

        out
    }
}
