/*!
 * Text-level editing helpers.
 *
 * Search and replace across cues (literal or regex), speaker prefix
 * detection, plain-text import, inline formatting markup and fixing text
 * typed on the wrong keyboard layout.
 */

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;
use std::str::FromStr;

use crate::cue::Cue;
use crate::errors::SubtitleError;

// @const: `Name: text`, `Name : text` or `- Name: text`
static SPEAKER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(?:-\s*)?([А-ЯЁA-Z][а-яёa-z]+)\s*:\s*(.+)$").unwrap()
});

// @const: ASS override blocks and HTML-like tags
static FORMATTING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{[^}]*\}|<[^>]*>").unwrap()
});

/// Search behaviour flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Treat the query as a regular expression instead of literal text
    pub regex: bool,
    /// Match letter case exactly
    pub case_sensitive: bool,
}

impl SearchOptions {
    pub fn literal() -> Self {
        Self::default()
    }

    pub fn regex() -> Self {
        Self { regex: true, case_sensitive: false }
    }

    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }
}

/// Matches inside a single cue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    /// Index of the cue in the searched slice
    pub cue_index: usize,
    /// Byte ranges of every match in the cue text
    pub ranges: Vec<Range<usize>>,
}

/// Compile a query into a regex. An empty query yields `None`.
pub fn build_pattern(query: &str, options: SearchOptions) -> Result<Option<Regex>, SubtitleError> {
    if query.is_empty() {
        return Ok(None);
    }

    let source = if options.regex {
        query.to_string()
    } else {
        regex::escape(query)
    };

    RegexBuilder::new(&source)
        .case_insensitive(!options.case_sensitive)
        .build()
        .map(Some)
        .map_err(|e| SubtitleError::parse(format!("invalid search pattern '{}': {}", query, e)))
}

/// Find all matches of `query` across cue texts
pub fn search(cues: &[Cue], query: &str, options: SearchOptions) -> Result<Vec<SearchMatch>, SubtitleError> {
    let pattern = match build_pattern(query, options)? {
        Some(pattern) => pattern,
        None => return Ok(Vec::new()),
    };

    Ok(cues
        .iter()
        .enumerate()
        .filter_map(|(cue_index, cue)| {
            let ranges: Vec<Range<usize>> = pattern
                .find_iter(&cue.text)
                .filter(|m| !m.is_empty())
                .map(|m| m.range())
                .collect();
            if ranges.is_empty() {
                None
            } else {
                Some(SearchMatch { cue_index, ranges })
            }
        })
        .collect())
}

/// Replace all matches in one text. Regex queries may reference groups (`$1`);
/// literal queries insert the replacement verbatim.
pub fn replace_in_text(text: &str, pattern: &Regex, replacement: &str, options: SearchOptions) -> String {
    if options.regex {
        pattern.replace_all(text, replacement).into_owned()
    } else {
        pattern.replace_all(text, NoExpand(replacement)).into_owned()
    }
}

/// Split a `Name: text` prefix off a cue text
pub fn detect_speaker(text: &str) -> Option<(String, String)> {
    let caps = SPEAKER_REGEX.captures(text.trim())?;
    let rest = caps[2].trim();
    if rest.is_empty() {
        return None;
    }
    Some((caps[1].trim().to_string(), rest.to_string()))
}

/// One cue per non-blank line, laid out in consecutive `duration`-long slots
pub fn import_plain_text(text: &str, start: f64, duration: f64) -> Vec<Cue> {
    let start = if start.is_finite() { start.max(0.0) } else { 0.0 };
    let duration = if duration.is_finite() && duration > 0.0 { duration } else { 3.0 };

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(i, line)| {
            let cue_start = start + i as f64 * duration;
            Cue::new(i + 1, cue_start, cue_start + duration, line)
        })
        .collect()
}

/// Remove `{...}` override blocks and `<...>` tags, then trim
pub fn strip_formatting(text: &str) -> String {
    FORMATTING_REGEX.replace_all(text, "").trim().to_string()
}

/// Inline style toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextStyle {
    Bold,
    Italic,
    Underline,
    Strikeout,
}

impl TextStyle {
    fn tag(&self) -> char {
        match self {
            Self::Bold => 'b',
            Self::Italic => 'i',
            Self::Underline => 'u',
            Self::Strikeout => 's',
        }
    }
}

impl FromStr for TextStyle {
    type Err = SubtitleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bold" | "b" => Ok(Self::Bold),
            "italic" | "i" => Ok(Self::Italic),
            "underline" | "u" => Ok(Self::Underline),
            "strikeout" | "strike" | "s" => Ok(Self::Strikeout),
            other => Err(SubtitleError::parse(format!("unknown text style '{}'", other))),
        }
    }
}

/// Preset colours, rendered as ASS `&HBBGGRR&` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextColor {
    Red,
    Green,
    Blue,
    Yellow,
    White,
    Black,
}

impl TextColor {
    pub fn ass_code(&self) -> &'static str {
        match self {
            Self::Red => "&H0000FF&",
            Self::Green => "&H00FF00&",
            Self::Blue => "&HFF0000&",
            Self::Yellow => "&H00FFFF&",
            Self::White => "&HFFFFFF&",
            Self::Black => "&H000000&",
        }
    }
}

impl FromStr for TextColor {
    type Err = SubtitleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "green" => Ok(Self::Green),
            "blue" => Ok(Self::Blue),
            "yellow" => Ok(Self::Yellow),
            "white" => Ok(Self::White),
            "black" => Ok(Self::Black),
            other => Err(SubtitleError::parse(format!("unknown text color '{}'", other))),
        }
    }
}

/// Wrap the unformatted text in ASS override tags.
///
/// Existing markup is stripped first so repeated application does not nest.
pub fn apply_style(text: &str, style: Option<TextStyle>, color: Option<TextColor>) -> String {
    let mut styled = strip_formatting(text);

    if let Some(style) = style {
        let tag = style.tag();
        styled = format!("{{\\{tag}1}}{styled}{{\\{tag}0}}");
    }

    if let Some(color) = color {
        styled = format!("{{\\c{}}}{}{{\\c}}", color.ass_code(), styled);
    }

    styled
}

// @const: Russian ЙЦУКЕН key and the Latin QWERTY character on the same key
const LAYOUT_KEYS: [(char, char); 66] = [
    ('й', 'q'), ('ц', 'w'), ('у', 'e'), ('к', 'r'), ('е', 't'), ('н', 'y'), ('г', 'u'), ('ш', 'i'),
    ('щ', 'o'), ('з', 'p'), ('х', '['), ('ъ', ']'), ('ф', 'a'), ('ы', 's'), ('в', 'd'), ('а', 'f'),
    ('п', 'g'), ('р', 'h'), ('о', 'j'), ('л', 'k'), ('д', 'l'), ('ж', ';'), ('э', '\''), ('я', 'z'),
    ('ч', 'x'), ('с', 'c'), ('м', 'v'), ('и', 'b'), ('т', 'n'), ('ь', 'm'), ('б', ','), ('ю', '.'),
    ('ё', '`'),
    ('Й', 'Q'), ('Ц', 'W'), ('У', 'E'), ('К', 'R'), ('Е', 'T'), ('Н', 'Y'), ('Г', 'U'), ('Ш', 'I'),
    ('Щ', 'O'), ('З', 'P'), ('Х', '{'), ('Ъ', '}'), ('Ф', 'A'), ('Ы', 'S'), ('В', 'D'), ('А', 'F'),
    ('П', 'G'), ('Р', 'H'), ('О', 'J'), ('Л', 'K'), ('Д', 'L'), ('Ж', ':'), ('Э', '"'), ('Я', 'Z'),
    ('Ч', 'X'), ('С', 'C'), ('М', 'V'), ('И', 'B'), ('Т', 'N'), ('Ь', 'M'), ('Б', '<'), ('Ю', '>'),
    ('Ё', '~'),
];

static RU_TO_EN: Lazy<HashMap<char, char>> = Lazy::new(|| LAYOUT_KEYS.iter().copied().collect());

static EN_TO_RU: Lazy<HashMap<char, char>> =
    Lazy::new(|| LAYOUT_KEYS.iter().map(|&(ru, en)| (en, ru)).collect());

/// Direction of a keyboard layout switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutDirection {
    /// Text typed on the Russian layout that was meant as Latin
    RuToEn,
    /// Text typed on the Latin layout that was meant as Russian
    EnToRu,
}

impl LayoutDirection {
    /// Pick the direction from whichever layout has more mapped characters.
    /// Ties go to `RuToEn`.
    pub fn detect(text: &str) -> Self {
        let ru = text.chars().filter(|c| RU_TO_EN.contains_key(c)).count();
        let en = text.chars().filter(|c| EN_TO_RU.contains_key(c)).count();
        if ru >= en { Self::RuToEn } else { Self::EnToRu }
    }

    fn table(&self) -> &'static HashMap<char, char> {
        match self {
            Self::RuToEn => &RU_TO_EN,
            Self::EnToRu => &EN_TO_RU,
        }
    }
}

fn is_layout_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, 'а'..='я' | 'А'..='Я' | 'ё' | 'Ё')
}

// Punctuation keys that are letters on the other layout
fn is_layout_ambiguous(c: char) -> bool {
    matches!(c, ';' | '\'' | ',' | '.' | '`' | '[' | ']' | '{' | '}' | ':' | '"' | '<' | '>' | '~')
}

fn is_layout_word_char(chars: &[char], i: usize) -> bool {
    let c = chars[i];
    if is_layout_letter(c) {
        return true;
    }
    if !is_layout_ambiguous(c) {
        return false;
    }
    let prev = i.checked_sub(1).map(|p| chars[p]);
    let next = chars.get(i + 1).copied();
    prev.is_some_and(is_layout_letter) || next.is_some_and(is_layout_letter)
}

/// Retype every character of `word` on the other keyboard layout
pub fn switch_word(word: &str, direction: LayoutDirection) -> String {
    let table = direction.table();
    word.chars().map(|c| table.get(&c).copied().unwrap_or(c)).collect()
}

/// Fix text typed on the wrong keyboard layout, word by word.
///
/// Punctuation keys count as part of a word only next to a letter, so a
/// sentence-ending period or a lone quote survives. With no direction each
/// word picks its own.
pub fn switch_layout(text: &str, direction: Option<LayoutDirection>) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if !is_layout_word_char(&chars, i) {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && is_layout_word_char(&chars, i) {
            i += 1;
        }
        let word: String = chars[start..i].iter().collect();
        let word_direction = direction.unwrap_or_else(|| LayoutDirection::detect(&word));
        out.push_str(&switch_word(&word, word_direction));
    }

    out
}
