use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::SubtitleError;

// @module: Cue value type and its editable fields

// @struct: Single timed subtitle entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    // @field: 1-based display number, reassigned when order changes
    pub id: usize,

    // @field: Start time in seconds
    pub start: f64,

    // @field: End time in seconds
    pub end: f64,

    // @field: Text, may contain newlines and inline markup
    pub text: String,

    // @field: Optional speaker label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,

    // @field: Optional on-screen placement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<CuePosition>,
}

impl Cue {
    /// Create a cue without speaker or position
    pub fn new(id: usize, start: f64, end: f64, text: impl Into<String>) -> Self {
        Cue {
            id,
            start,
            end,
            text: text.into(),
            speaker: None,
            position: None,
        }
    }

    /// Builder-style speaker assignment
    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }

    /// Builder-style position assignment
    pub fn with_position(mut self, position: CuePosition) -> Self {
        self.position = Some(position);
        self
    }

    /// Duration in seconds (negative when the bounds are crossed)
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `at` falls inside `[start, end]`
    pub fn contains(&self, at: f64) -> bool {
        at >= self.start && at <= self.end
    }

    /// Text with a `Speaker: ` prefix when a speaker is set
    pub fn display_text(&self) -> String {
        match self.speaker.as_deref() {
            Some(speaker) if !speaker.is_empty() => format!("{}: {}", speaker, self.text),
            _ => self.text.clone(),
        }
    }
}

/// Screen placement of a cue. Only affects drawing, never timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CuePosition {
    Bottom,
    Top,
    Middle,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl CuePosition {
    /// All placements in menu order
    pub const ALL: [CuePosition; 7] = [
        CuePosition::Bottom,
        CuePosition::Top,
        CuePosition::Middle,
        CuePosition::TopLeft,
        CuePosition::TopRight,
        CuePosition::BottomLeft,
        CuePosition::BottomRight,
    ];

    /// Numpad-style ASS `\an` alignment value
    pub fn ass_alignment(&self) -> u8 {
        match self {
            Self::BottomLeft => 1,
            Self::Bottom => 2,
            Self::BottomRight => 3,
            Self::Middle => 5,
            Self::TopLeft => 7,
            Self::Top => 8,
            Self::TopRight => 9,
        }
    }

    /// Inverse of [`CuePosition::ass_alignment`]; 4 and 6 have no counterpart
    pub fn from_ass_alignment(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::BottomLeft),
            2 => Some(Self::Bottom),
            3 => Some(Self::BottomRight),
            5 => Some(Self::Middle),
            7 => Some(Self::TopLeft),
            8 => Some(Self::Top),
            9 => Some(Self::TopRight),
            _ => None,
        }
    }

    /// Kebab-case name as used in the JSON payload
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bottom => "bottom",
            Self::Top => "top",
            Self::Middle => "middle",
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
        }
    }
}

impl fmt::Display for CuePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CuePosition {
    type Err = SubtitleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| SubtitleError::parse(format!("unknown cue position '{}'", s)))
    }
}

/// A single-field edit applied through `CueStore::set_field`
#[derive(Debug, Clone, PartialEq)]
pub enum CueField {
    Start(f64),
    End(f64),
    Text(String),
    Speaker(Option<String>),
}

impl CueField {
    /// Which field this edit touches
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Start(_) => FieldKind::Start,
            Self::End(_) => FieldKind::End,
            Self::Text(_) => FieldKind::Text,
            Self::Speaker(_) => FieldKind::Speaker,
        }
    }
}

/// Field discriminant reported in change notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Start,
    End,
    Text,
    Speaker,
}
