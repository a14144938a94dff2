/*!
 * Temporal overlap detection and repair.
 *
 * Two neighbouring cues overlap when the first one ends after the second
 * one starts. Detection only looks at adjacent pairs in list order, so the
 * list is expected to be sorted by start time for meaningful results.
 */

use log::debug;
use std::fmt;

use crate::cue::Cue;

/// Gap left between a shortened cue and its successor, in seconds
pub const DEFAULT_OVERLAP_GAP: f64 = 0.1;

/// One detected overlap between two adjacent cues
#[derive(Debug, Clone, PartialEq)]
pub struct Overlap {
    /// Index of the earlier cue
    pub first_index: usize,
    /// Index of the later cue (always `first_index + 1`)
    pub second_index: usize,
    /// How far the earlier cue runs into the later one
    pub overlap_seconds: f64,
}

impl fmt::Display for Overlap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cue #{} overlaps cue #{} by {:.3}s",
            self.first_index + 1,
            self.second_index + 1,
            self.overlap_seconds
        )
    }
}

/// Detects and fixes overlaps between adjacent cues
#[derive(Debug, Clone)]
pub struct OverlapResolver {
    gap: f64,
}

impl OverlapResolver {
    /// Create a resolver with the default 0.1 s gap
    pub fn new() -> Self {
        Self { gap: DEFAULT_OVERLAP_GAP }
    }

    /// Create a resolver with a custom gap (negative values are treated as zero)
    pub fn with_gap(gap: f64) -> Self {
        let gap = if gap.is_finite() { gap.max(0.0) } else { DEFAULT_OVERLAP_GAP };
        Self { gap }
    }

    /// Configured gap in seconds
    pub fn gap(&self) -> f64 {
        self.gap
    }

    /// Find every adjacent pair where the earlier cue ends after the later one starts
    pub fn detect(cues: &[Cue]) -> Vec<Overlap> {
        cues.windows(2)
            .enumerate()
            .filter(|(_, pair)| pair[0].end > pair[1].start)
            .map(|(i, pair)| Overlap {
                first_index: i,
                second_index: i + 1,
                overlap_seconds: pair[0].end - pair[1].start,
            })
            .collect()
    }

    /// Return a copy of `cues` with every overlap fixed
    pub fn resolve(&self, cues: &[Cue]) -> Vec<Cue> {
        let mut resolved = cues.to_vec();
        self.resolve_in_place(&mut resolved);
        resolved
    }

    /// Fix overlaps in a single forward pass, returning how many cues were shortened.
    ///
    /// The earlier cue's end is moved to `next.start - gap`, but never below its
    /// own start.
    pub fn resolve_in_place(&self, cues: &mut [Cue]) -> usize {
        let mut fixed = 0;

        for i in 0..cues.len().saturating_sub(1) {
            let next_start = cues[i + 1].start;
            let current = &mut cues[i];

            if current.end > next_start {
                let new_end = (next_start - self.gap).max(current.start);
                debug!(
                    "Shortening cue {} from {:.3}s to {:.3}s (next starts at {:.3}s)",
                    current.id, current.end, new_end, next_start
                );
                current.end = new_end;
                fixed += 1;
            }
        }

        fixed
    }
}

impl Default for OverlapResolver {
    fn default() -> Self {
        Self::new()
    }
}
