/*!
 * Store statistics and readability analysis.
 *
 * Readability is measured in words per second:
 * - below 1.5 is slow
 * - above 3 is fast, above 4 very fast
 * - anything in between is optimal
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cue::Cue;
use crate::overlap::{Overlap, OverlapResolver};
use crate::timecode;

const SLOW_WPS: f64 = 1.5;
const FAST_WPS: f64 = 3.0;
const VERY_FAST_WPS: f64 = 4.0;

/// Aggregate numbers for a cue list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total: usize,
    /// Sum of cue durations in seconds
    pub total_duration: f64,
    pub average_duration: f64,
    pub total_characters: usize,
}

impl StoreStats {
    pub fn from_cues(cues: &[Cue]) -> Self {
        if cues.is_empty() {
            return Self::default();
        }

        let total_duration: f64 = cues.iter().map(|c| c.duration().max(0.0)).sum();
        Self {
            total: cues.len(),
            total_duration,
            average_duration: total_duration / cues.len() as f64,
            total_characters: cues.iter().map(|c| c.text.chars().count()).sum(),
        }
    }
}

/// Reading-speed bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Readability {
    Slow,
    Optimal,
    Fast,
    VeryFast,
}

impl Readability {
    pub fn from_wps(wps: f64) -> Self {
        if wps > VERY_FAST_WPS {
            Self::VeryFast
        } else if wps > FAST_WPS {
            Self::Fast
        } else if wps < SLOW_WPS {
            Self::Slow
        } else {
            Self::Optimal
        }
    }
}

impl fmt::Display for Readability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Slow => "slow",
            Self::Optimal => "optimal",
            Self::Fast => "fast",
            Self::VeryFast => "very-fast",
        };
        write!(f, "{}", name)
    }
}

/// Readability of one cue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadabilityScore {
    pub cue_index: usize,
    pub words: usize,
    pub words_per_second: f64,
    pub rating: Readability,
}

impl ReadabilityScore {
    /// Zero or negative duration counts as infinitely fast
    pub fn for_cue(cue_index: usize, cue: &Cue) -> Self {
        let words = cue.text.split_whitespace().count();
        let duration = cue.duration();
        let words_per_second = if duration > 0.0 {
            words as f64 / duration
        } else {
            f64::INFINITY
        };

        Self {
            cue_index,
            words,
            words_per_second,
            rating: Readability::from_wps(words_per_second),
        }
    }
}

/// Full report over a cue list
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub stats: StoreStats,
    pub overlaps: Vec<Overlap>,
    pub scores: Vec<ReadabilityScore>,
}

impl AnalysisReport {
    pub fn analyze(cues: &[Cue]) -> Self {
        Self {
            stats: StoreStats::from_cues(cues),
            overlaps: OverlapResolver::detect(cues),
            scores: cues
                .iter()
                .enumerate()
                .map(|(i, cue)| ReadabilityScore::for_cue(i, cue))
                .collect(),
        }
    }

    /// Number of cues in a readability bucket
    pub fn count(&self, rating: Readability) -> usize {
        self.scores.iter().filter(|s| s.rating == rating).count()
    }

    /// Cues rated fast or very fast
    pub fn too_fast(&self) -> impl Iterator<Item = &ReadabilityScore> {
        self.scores
            .iter()
            .filter(|s| matches!(s.rating, Readability::Fast | Readability::VeryFast))
    }

    /// No overlaps and nothing rated very fast
    pub fn is_clean(&self) -> bool {
        self.overlaps.is_empty() && self.count(Readability::VeryFast) == 0
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cues: {}", self.stats.total)?;
        writeln!(f, "Total duration: {}", timecode::format_short(self.stats.total_duration))?;
        writeln!(f, "Average duration: {:.2}s", self.stats.average_duration)?;
        writeln!(f, "Characters: {}", self.stats.total_characters)?;
        writeln!(f, "Overlaps: {}", self.overlaps.len())?;
        for overlap in &self.overlaps {
            writeln!(f, "  {}", overlap)?;
        }
        writeln!(
            f,
            "Readability: {} slow, {} optimal, {} fast, {} very fast",
            self.count(Readability::Slow),
            self.count(Readability::Optimal),
            self.count(Readability::Fast),
            self.count(Readability::VeryFast)
        )
    }
}
