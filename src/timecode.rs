/*!
 * Time code conversion.
 *
 * Converts between a floating-point second count and the textual time codes
 * used by the supported subtitle formats:
 * - SRT: `HH:MM:SS,mmm`
 * - WebVTT: `HH:MM:SS.mmm`
 * - ASS: `H:MM:SS.cc` (centiseconds)
 *
 * Formatting rounds to the style's precision so that parsing a formatted
 * value always yields the original time within that precision.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::SubtitleError;

// @const: Ordered parse patterns, first match wins
static COMMA_MILLIS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+):(\d{2}):(\d{2}),(\d{1,3})$").unwrap()
});

static DOT_MILLIS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+):(\d{2}):(\d{2})\.(\d{1,3})$").unwrap()
});

static BARE_HMS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+):(\d{2}):(\d{2})$").unwrap()
});

static MINUTES_SECONDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2})(?:[.,](\d{1,3}))?$").unwrap()
});

static ASS_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+):(\d{2}):(\d{2})\.(\d{1,3})$").unwrap()
});

/// Textual time code style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeStyle {
    /// `HH:MM:SS,mmm`
    Srt,
    /// `HH:MM:SS.mmm`
    Vtt,
    /// `H:MM:SS.cc`
    Ass,
}

impl TimeStyle {
    /// Smallest representable step in seconds
    pub fn precision(&self) -> f64 {
        match self {
            Self::Srt | Self::Vtt => 0.001,
            Self::Ass => 0.01,
        }
    }

    /// Rendering of zero (also used for negative or non-finite input)
    pub fn zero(&self) -> &'static str {
        match self {
            Self::Srt => "00:00:00,000",
            Self::Vtt => "00:00:00.000",
            Self::Ass => "0:00:00.00",
        }
    }
}

impl fmt::Display for TimeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Srt => "srt",
            Self::Vtt => "vtt",
            Self::Ass => "ass",
        };
        write!(f, "{}", name)
    }
}

/// Format a second count as a time code in the given style
pub fn format(seconds: f64, style: TimeStyle) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return style.zero().to_string();
    }

    match style {
        TimeStyle::Srt | TimeStyle::Vtt => {
            let separator = if style == TimeStyle::Srt { ',' } else { '.' };
            let total_ms = (seconds * 1000.0).round() as u64;
            let hours = total_ms / 3_600_000;
            let minutes = (total_ms % 3_600_000) / 60_000;
            let secs = (total_ms % 60_000) / 1_000;
            let millis = total_ms % 1_000;
            format!("{:02}:{:02}:{:02}{}{:03}", hours, minutes, secs, separator, millis)
        }
        TimeStyle::Ass => {
            let total_cs = (seconds * 100.0).round() as u64;
            let hours = total_cs / 360_000;
            let minutes = (total_cs % 360_000) / 6_000;
            let secs = (total_cs % 6_000) / 100;
            let centis = total_cs % 100;
            format!("{}:{:02}:{:02}.{:02}", hours, minutes, secs, centis)
        }
    }
}

/// Short `M:SS` rendering used for durations in reports
pub fn format_short(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let whole = seconds.floor() as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}

/// Parse a time code into seconds.
///
/// Accepted forms, tried in this order: `HH:MM:SS,mmm`, `HH:MM:SS.mmm`,
/// `HH:MM:SS`, `MM:SS` (optionally with a fraction). A two-part value such as
/// `01:02` is always minutes and seconds.
pub fn parse(text: &str) -> Result<f64, SubtitleError> {
    let trimmed = text.trim();

    for pattern in [&*COMMA_MILLIS, &*DOT_MILLIS] {
        if let Some(caps) = pattern.captures(trimmed) {
            return hms_to_seconds(trimmed, &caps[1], &caps[2], &caps[3], Some(&caps[4]));
        }
    }

    if let Some(caps) = BARE_HMS.captures(trimmed) {
        return hms_to_seconds(trimmed, &caps[1], &caps[2], &caps[3], None);
    }

    if let Some(caps) = MINUTES_SECONDS.captures(trimmed) {
        let fraction = caps.get(3).map(|m| m.as_str());
        return hms_to_seconds(trimmed, "0", &caps[1], &caps[2], fraction);
    }

    Err(SubtitleError::parse(format!("unrecognized time code '{}'", trimmed)))
}

/// Parse an ASS time code (`H:MM:SS.cc`) into seconds
pub fn parse_ass(text: &str) -> Result<f64, SubtitleError> {
    let trimmed = text.trim();
    let caps = ASS_TIME
        .captures(trimmed)
        .ok_or_else(|| SubtitleError::parse(format!("unrecognized ASS time code '{}'", trimmed)))?;
    hms_to_seconds(trimmed, &caps[1], &caps[2], &caps[3], Some(&caps[4]))
}

/// Parse a `start --> end` line; anything after the end time code is ignored
pub fn parse_range(line: &str) -> Result<(f64, f64), SubtitleError> {
    let (start, rest) = line
        .split_once("-->")
        .ok_or_else(|| SubtitleError::parse(format!("missing '-->' in time range '{}'", line.trim())))?;
    let end = rest
        .split_whitespace()
        .next()
        .ok_or_else(|| SubtitleError::parse(format!("missing end time in '{}'", line.trim())))?;
    Ok((parse(start)?, parse(end)?))
}

fn hms_to_seconds(
    original: &str,
    hours: &str,
    minutes: &str,
    seconds: &str,
    fraction: Option<&str>,
) -> Result<f64, SubtitleError> {
    let bad = || SubtitleError::parse(format!("invalid time code '{}'", original));

    let hours: u64 = hours.parse().map_err(|_| bad())?;
    let minutes: u64 = minutes.parse().map_err(|_| bad())?;
    let seconds: u64 = seconds.parse().map_err(|_| bad())?;
    if minutes >= 60 || seconds >= 60 {
        return Err(SubtitleError::parse(format!(
            "time component out of range in '{}'",
            original
        )));
    }

    // "5" means 500 ms, "05" means 50 ms
    let millis: u64 = match fraction {
        Some(frac) => format!("{:0<3}", frac).parse().map_err(|_| bad())?,
        None => 0,
    };

    let total_ms = hours
        .checked_mul(60)
        .and_then(|m| m.checked_add(minutes))
        .and_then(|m| m.checked_mul(60))
        .and_then(|s| s.checked_add(seconds))
        .and_then(|s| s.checked_mul(1000))
        .and_then(|ms| ms.checked_add(millis))
        .ok_or_else(|| SubtitleError::parse(format!("time code out of range in '{}'", original)))?;
    Ok(total_ms as f64 / 1000.0)
}
