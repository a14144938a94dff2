/*!
 * Ordered cue collection.
 *
 * The store owns the cue list and keeps its invariants:
 * - ids are `1..N` in store order after every id-normalizing operation
 * - per-cue edits keep `0 <= start <= end`
 * - order is insertion order until `sort_by_start` is called
 *
 * Every mutating operation notifies the registered change listeners in
 * registration order.
 */

use log::{debug, warn};
use std::collections::BTreeSet;
use std::fmt;

use crate::cue::{Cue, CueField, CuePosition, FieldKind};
use crate::errors::SubtitleError;
use crate::overlap::{Overlap, OverlapResolver};
use crate::text_tools::{self, LayoutDirection, SearchOptions, TextColor, TextStyle};

/// Source of the current playback position used to seed new cues
pub trait PlaybackClock {
    /// Current position in seconds, `None` when nothing is loaded
    fn current_time(&self) -> Option<f64>;
}

/// Timing constants applied by store operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingRules {
    /// Length of a freshly added cue, also used to repair crossed bounds
    pub default_duration: f64,
    /// Distance kept before the next cue by `insert_between`
    pub insert_gap: f64,
    /// Distance kept before the next cue when resolving overlaps
    pub overlap_gap: f64,
    /// Length given to cues repaired by `fix_negative_durations`
    pub min_duration: f64,
}

impl Default for TimingRules {
    fn default() -> Self {
        Self {
            default_duration: 3.0,
            insert_gap: 0.5,
            overlap_gap: 0.1,
            min_duration: 1.0,
        }
    }
}

/// What a mutating store operation did
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    /// Contents replaced wholesale
    Loaded { count: usize },
    /// Cue appended at `index`
    Added { index: usize },
    /// Cue inserted at `index`
    Inserted { index: usize },
    /// Cue removed from `index`
    Deleted { index: usize },
    /// Single field edited
    FieldChanged { index: usize, field: FieldKind },
    /// Placement edited
    PositionChanged { index: usize },
    /// Order or ids changed
    Reordered,
    /// Bulk timing transform touched `affected` cues
    Retimed { affected: usize },
    /// Bulk text transform touched `affected` cues
    TextChanged { affected: usize },
    /// Cues appended from plain text
    Imported { count: usize },
}

/// Callback invoked after every mutation with the new contents
pub type ChangeListener = Box<dyn FnMut(&StoreChange, &[Cue]) + Send + Sync>;

/// Ordered collection of cues
pub struct CueStore {
    cues: Vec<Cue>,
    rules: TimingRules,
    listeners: Vec<ChangeListener>,
}

impl CueStore {
    /// Create an empty store with default timing rules
    pub fn new() -> Self {
        Self::with_rules(TimingRules::default())
    }

    /// Create an empty store with custom timing rules
    pub fn with_rules(rules: TimingRules) -> Self {
        Self {
            cues: Vec::new(),
            rules,
            listeners: Vec::new(),
        }
    }

    /// Create a store holding `cues` as given
    pub fn from_cues(cues: Vec<Cue>) -> Self {
        let mut store = Self::new();
        store.cues = cues;
        store
    }

    pub fn rules(&self) -> &TimingRules {
        &self.rules
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Cue> {
        self.cues.get(index)
    }

    /// Owned copy of the current contents
    pub fn snapshot(&self) -> Vec<Cue> {
        self.cues.clone()
    }

    /// Register a listener; listeners run in registration order
    pub fn on_change<F>(&mut self, listener: F)
    where
        F: FnMut(&StoreChange, &[Cue]) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Replace the contents. Ids are kept as given.
    pub fn load(&mut self, cues: Vec<Cue>) {
        debug!("Loading {} cues into store", cues.len());
        self.cues = cues;
        let count = self.cues.len();
        self.emit(StoreChange::Loaded { count });
    }

    /// Append a cue starting at `playback_position` (or 0). Returns its index.
    pub fn add(&mut self, playback_position: Option<f64>) -> usize {
        let start = playback_position
            .filter(|p| p.is_finite())
            .map(|p| p.max(0.0))
            .unwrap_or(0.0);
        let id = self.cues.iter().map(|c| c.id).max().map_or(1, |max| max + 1);

        self.cues.push(Cue::new(id, start, start + self.rules.default_duration, ""));
        let index = self.cues.len() - 1;
        self.emit(StoreChange::Added { index });
        index
    }

    /// Append a cue at the clock's current position
    pub fn add_from_clock(&mut self, clock: &dyn PlaybackClock) -> usize {
        self.add(clock.current_time())
    }

    /// Insert a cue at `index`, filling the space after the previous cue
    pub fn insert_between(&mut self, index: usize) -> Result<usize, SubtitleError> {
        let len = self.cues.len();
        if index > len {
            return Err(SubtitleError::IndexOutOfRange { index, len });
        }

        let start = if index > 0 { self.cues[index - 1].end.max(0.0) } else { 0.0 };
        let mut end = start + self.rules.default_duration;
        if let Some(next) = self.cues.get(index) {
            end = end.min(next.start - self.rules.insert_gap);
        }
        let end = end.max(start);

        self.cues.insert(index, Cue::new(0, start, end, ""));
        self.renumber_silently();
        self.emit(StoreChange::Inserted { index });
        Ok(index)
    }

    /// Remove and return the cue at `index`
    pub fn delete(&mut self, index: usize) -> Result<Cue, SubtitleError> {
        self.check_index(index)?;
        let removed = self.cues.remove(index);
        self.renumber_silently();
        self.emit(StoreChange::Deleted { index });
        Ok(removed)
    }

    /// Edit one field of the cue at `index`.
    ///
    /// A start past the end pushes the end out by the default duration; an end
    /// before the start pulls the start back by the same amount (not below 0).
    pub fn set_field(&mut self, index: usize, field: CueField) -> Result<(), SubtitleError> {
        self.check_index(index)?;
        if let CueField::Start(value) | CueField::End(value) = field {
            validate_time(value)?;
        }

        let kind = field.kind();
        let default_duration = self.rules.default_duration;
        let cue = &mut self.cues[index];

        match field {
            CueField::Start(start) => {
                cue.start = start;
                if cue.start > cue.end {
                    cue.end = cue.start + default_duration;
                }
            }
            CueField::End(end) => {
                cue.end = end;
                if cue.end < cue.start {
                    cue.start = (cue.end - default_duration).max(0.0);
                }
            }
            CueField::Text(text) => cue.text = text,
            CueField::Speaker(speaker) => {
                cue.speaker = speaker.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
            }
        }

        self.emit(StoreChange::FieldChanged { index, field: kind });
        Ok(())
    }

    /// Change the placement of the cue at `index`
    pub fn set_position(&mut self, index: usize, position: Option<CuePosition>) -> Result<(), SubtitleError> {
        self.check_index(index)?;
        self.cues[index].position = position;
        self.emit(StoreChange::PositionChanged { index });
        Ok(())
    }

    /// Wrap the text of the cue at `index` in inline style overrides
    pub fn apply_style(
        &mut self,
        index: usize,
        style: Option<TextStyle>,
        color: Option<TextColor>,
    ) -> Result<(), SubtitleError> {
        self.check_index(index)?;
        let styled = text_tools::apply_style(&self.cues[index].text, style, color);
        self.cues[index].text = styled;
        self.emit(StoreChange::FieldChanged { index, field: FieldKind::Text });
        Ok(())
    }

    /// Stable sort by start time, then renumber
    pub fn sort_by_start(&mut self) {
        self.cues.sort_by(|a, b| a.start.total_cmp(&b.start));
        self.renumber_silently();
        self.emit(StoreChange::Reordered);
    }

    /// Reassign ids `1..N` in store order
    pub fn renumber(&mut self) {
        self.renumber_silently();
        self.emit(StoreChange::Reordered);
    }

    /// Move every cue by `delta` seconds, clamping at zero
    pub fn shift_all(&mut self, delta: f64) -> Result<(), SubtitleError> {
        if !delta.is_finite() {
            return Err(SubtitleError::InvalidTime(format!("shift of {}", delta)));
        }
        for cue in &mut self.cues {
            cue.start = (cue.start + delta).max(0.0);
            cue.end = (cue.end + delta).max(0.0);
        }
        let affected = self.cues.len();
        self.emit(StoreChange::Retimed { affected });
        Ok(())
    }

    /// Move every bound at or after `threshold` by `delta` seconds.
    /// Returns the number of cues with at least one moved bound.
    pub fn shift_from(&mut self, threshold: f64, delta: f64) -> Result<usize, SubtitleError> {
        if !delta.is_finite() || !threshold.is_finite() {
            return Err(SubtitleError::InvalidTime(format!(
                "shift of {} from {}",
                delta, threshold
            )));
        }

        let mut affected = 0;
        for cue in &mut self.cues {
            let mut touched = false;
            if cue.start >= threshold {
                cue.start = (cue.start + delta).max(0.0);
                touched = true;
            }
            if cue.end >= threshold {
                cue.end = (cue.end + delta).max(0.0);
                touched = true;
            }
            if touched {
                affected += 1;
            }
        }

        self.emit(StoreChange::Retimed { affected });
        Ok(affected)
    }

    /// Multiply every time by `factor`
    pub fn stretch(&mut self, factor: f64) -> Result<(), SubtitleError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(SubtitleError::InvalidTime(format!("stretch factor {}", factor)));
        }
        for cue in &mut self.cues {
            cue.start = (cue.start * factor).max(0.0);
            cue.end = (cue.end * factor).max(0.0);
        }
        let affected = self.cues.len();
        self.emit(StoreChange::Retimed { affected });
        Ok(())
    }

    /// Give every cue with `end <= start` the minimum duration
    pub fn fix_negative_durations(&mut self) -> usize {
        let min_duration = self.rules.min_duration;
        let mut affected = 0;
        for cue in &mut self.cues {
            if cue.end <= cue.start {
                cue.end = cue.start + min_duration;
                affected += 1;
            }
        }

        if affected > 0 {
            warn!("Fixed {} cues with non-positive duration", affected);
            self.emit(StoreChange::Retimed { affected });
        }
        affected
    }

    /// First cue whose `[start, end]` contains `at`
    pub fn find(&self, at: f64) -> Option<(usize, &Cue)> {
        self.cues.iter().enumerate().find(|(_, cue)| cue.contains(at))
    }

    /// Adjacent overlaps in store order
    pub fn overlaps(&self) -> Vec<Overlap> {
        OverlapResolver::detect(&self.cues)
    }

    /// Shorten overlapping cues in place. Returns the number of cues shortened.
    pub fn resolve_overlaps(&mut self) -> usize {
        let affected = OverlapResolver::with_gap(self.rules.overlap_gap).resolve_in_place(&mut self.cues);
        if affected > 0 {
            self.emit(StoreChange::Retimed { affected });
        }
        affected
    }

    /// Replace `query` in every cue text. Returns the number of cues changed.
    pub fn replace_text(
        &mut self,
        query: &str,
        replacement: &str,
        options: SearchOptions,
    ) -> Result<usize, SubtitleError> {
        let pattern = match text_tools::build_pattern(query, options)? {
            Some(pattern) => pattern,
            None => return Ok(0),
        };

        let mut affected = 0;
        for cue in &mut self.cues {
            let replaced = text_tools::replace_in_text(&cue.text, &pattern, replacement, options);
            if replaced != cue.text {
                cue.text = replaced;
                affected += 1;
            }
        }

        if affected > 0 {
            self.emit(StoreChange::TextChanged { affected });
        }
        Ok(affected)
    }

    /// Retype every cue on the other keyboard layout. Without a direction the
    /// first cue's text decides it for all. Returns the number of cues changed.
    pub fn switch_layout(&mut self, direction: Option<LayoutDirection>) -> usize {
        let Some(first) = self.cues.first() else {
            return 0;
        };
        let direction = direction.unwrap_or_else(|| LayoutDirection::detect(&first.text));
        debug!("Switching keyboard layout {:?}", direction);

        let mut affected = 0;
        for cue in &mut self.cues {
            let switched = text_tools::switch_layout(&cue.text, Some(direction));
            if switched != cue.text {
                cue.text = switched;
                affected += 1;
            }
        }

        if affected > 0 {
            self.emit(StoreChange::TextChanged { affected });
        }
        affected
    }

    /// Move `Name: ` prefixes into the speaker field; returns the names found
    pub fn extract_speakers(&mut self) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        let mut affected = 0;

        for cue in &mut self.cues {
            if let Some((speaker, rest)) = text_tools::detect_speaker(&cue.text) {
                cue.text = rest;
                cue.speaker = Some(speaker.clone());
                found.insert(speaker);
                affected += 1;
            }
        }

        if affected > 0 {
            self.emit(StoreChange::TextChanged { affected });
        }
        found
    }

    /// Append one cue per non-blank line, then sort and renumber
    pub fn import_lines(&mut self, text: &str, start: f64, duration: f64) -> usize {
        let imported = text_tools::import_plain_text(text, start, duration);
        let count = imported.len();
        if count == 0 {
            return 0;
        }

        self.cues.extend(imported);
        self.cues.sort_by(|a, b| a.start.total_cmp(&b.start));
        self.renumber_silently();
        self.emit(StoreChange::Imported { count });
        count
    }

    /// Consume the store, returning its cues
    pub fn into_cues(self) -> Vec<Cue> {
        self.cues
    }

    fn check_index(&self, index: usize) -> Result<(), SubtitleError> {
        if index < self.cues.len() {
            Ok(())
        } else {
            Err(SubtitleError::IndexOutOfRange { index, len: self.cues.len() })
        }
    }

    fn renumber_silently(&mut self) {
        for (i, cue) in self.cues.iter_mut().enumerate() {
            cue.id = i + 1;
        }
    }

    fn emit(&mut self, change: StoreChange) {
        for listener in self.listeners.iter_mut() {
            listener(&change, &self.cues);
        }
    }
}

fn validate_time(value: f64) -> Result<(), SubtitleError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SubtitleError::InvalidTime(format!("{}", value)))
    }
}

impl Default for CueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CueStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CueStore")
            .field("cues", &self.cues)
            .field("rules", &self.rules)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
