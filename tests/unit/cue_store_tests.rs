/*!
 * Tests for cue store editing operations
 */

use std::sync::{Arc, Mutex};

use subedit::cue::{Cue, CueField, CuePosition, FieldKind};
use subedit::cue_store::{CueStore, PlaybackClock, StoreChange, TimingRules};
use subedit::errors::SubtitleError;
use subedit::text_tools::{SearchOptions, TextStyle};

fn store_with(times: &[(f64, f64)]) -> CueStore {
    let cues = times
        .iter()
        .enumerate()
        .map(|(i, (s, e))| Cue::new(i + 1, *s, *e, format!("cue {}", i + 1)))
        .collect();
    CueStore::from_cues(cues)
}

fn ids(store: &CueStore) -> Vec<usize> {
    store.cues().iter().map(|c| c.id).collect()
}

struct FixedClock(Option<f64>);

impl PlaybackClock for FixedClock {
    fn current_time(&self) -> Option<f64> {
        self.0
    }
}

/// Test that add seeds the cue from the playback clock
#[test]
fn test_addFromClock_withPosition_shouldStartThere() {
    let mut store = store_with(&[(0.0, 1.0)]);

    let index = store.add_from_clock(&FixedClock(Some(12.5)));
    let cue = &store.cues()[index];

    assert_eq!((cue.start, cue.end), (12.5, 15.5));
    assert_eq!(cue.text, "");

    let index = store.add_from_clock(&FixedClock(None));
    assert_eq!(store.cues()[index].start, 0.0);
}

/// Test that new ids continue after the largest existing id
#[test]
fn test_add_withGappyIds_shouldUseMaxPlusOne() {
    let mut store = CueStore::from_cues(vec![Cue::new(4, 0.0, 1.0, "a"), Cue::new(9, 1.0, 2.0, "b")]);
    store.add(Some(5.0));
    assert_eq!(store.cues()[2].id, 10);
}

/// Test insertion at the front and at the end
#[test]
fn test_insertBetween_atBounds_shouldUseNeighbours() {
    let mut store = store_with(&[(1.0, 2.0)]);

    store.insert_between(0).unwrap();
    assert_eq!((store.cues()[0].start, store.cues()[0].end), (0.0, 0.5));

    store.insert_between(2).unwrap();
    assert_eq!((store.cues()[2].start, store.cues()[2].end), (2.0, 5.0));
    assert_eq!(ids(&store), vec![1, 2, 3]);
}

/// Test insertion past the end fails
#[test]
fn test_insertBetween_pastEnd_shouldFail() {
    let mut store = store_with(&[(0.0, 1.0)]);
    assert_eq!(
        store.insert_between(5),
        Err(SubtitleError::IndexOutOfRange { index: 5, len: 1 })
    );
}

/// Test deletion renumbers the remaining cues
#[test]
fn test_delete_shouldRenumberRemaining() {
    let mut store = store_with(&[(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)]);

    let removed = store.delete(1).unwrap();

    assert_eq!(removed.text, "cue 2");
    assert_eq!(ids(&store), vec![1, 2]);
    assert_eq!(store.cues()[1].text, "cue 3");
    assert!(store.delete(7).is_err());
}

/// Test the crossed-bounds repair rules of set_field
#[test]
fn test_setField_withCrossedBounds_shouldRepair() {
    let mut store = store_with(&[(10.0, 12.0)]);

    store.set_field(0, CueField::Start(20.0)).unwrap();
    assert_eq!((store.cues()[0].start, store.cues()[0].end), (20.0, 23.0));

    store.set_field(0, CueField::End(15.0)).unwrap();
    assert_eq!((store.cues()[0].start, store.cues()[0].end), (12.0, 15.0));

    store.set_field(0, CueField::End(1.0)).unwrap();
    assert_eq!((store.cues()[0].start, store.cues()[0].end), (0.0, 1.0));
}

/// Test that set_field rejects unusable times without touching the cue
#[test]
fn test_setField_withInvalidTime_shouldFail() {
    let mut store = store_with(&[(1.0, 2.0)]);

    assert!(matches!(store.set_field(0, CueField::Start(-1.0)), Err(SubtitleError::InvalidTime(_))));
    assert!(matches!(store.set_field(0, CueField::End(f64::NAN)), Err(SubtitleError::InvalidTime(_))));
    assert_eq!((store.cues()[0].start, store.cues()[0].end), (1.0, 2.0));
}

/// Test text, speaker and position edits
#[test]
fn test_setField_withTextAndSpeaker_shouldUpdate() {
    let mut store = store_with(&[(0.0, 1.0)]);

    store.set_field(0, CueField::Text("Hello\nthere".to_string())).unwrap();
    store.set_field(0, CueField::Speaker(Some("  Anna ".to_string()))).unwrap();
    store.set_position(0, Some(CuePosition::TopLeft)).unwrap();

    let cue = &store.cues()[0];
    assert_eq!(cue.text, "Hello\nthere");
    assert_eq!(cue.speaker.as_deref(), Some("Anna"));
    assert_eq!(cue.position, Some(CuePosition::TopLeft));

    store.set_field(0, CueField::Speaker(Some(String::new()))).unwrap();
    assert_eq!(store.cues()[0].speaker, None);
}

/// Test that listeners see every change in registration order
#[test]
fn test_onChange_shouldNotifyListenersInOrder() {
    let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let mut store = store_with(&[(0.0, 1.0)]);

    let first = Arc::clone(&log);
    store.on_change(move |change, cues| {
        first.lock().unwrap().push(format!("first {:?} {}", change, cues.len()));
    });
    let second = Arc::clone(&log);
    store.on_change(move |change, _| {
        second.lock().unwrap().push(format!("second {:?}", change));
    });

    store.add(None);
    store.set_field(0, CueField::Text("x".to_string())).unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 4);
    assert_eq!(log[0], format!("first {:?} 2", StoreChange::Added { index: 1 }));
    assert_eq!(log[1], format!("second {:?}", StoreChange::Added { index: 1 }));
    assert_eq!(
        log[3],
        format!("second {:?}", StoreChange::FieldChanged { index: 0, field: FieldKind::Text })
    );
}

/// Test that sort keeps equal starts in their original order
#[test]
fn test_sortByStart_shouldBeStableAndRenumber() {
    let mut store = CueStore::from_cues(vec![
        Cue::new(1, 5.0, 6.0, "late"),
        Cue::new(2, 1.0, 2.0, "early a"),
        Cue::new(3, 1.0, 3.0, "early b"),
    ]);

    store.sort_by_start();

    let texts: Vec<&str> = store.cues().iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["early a", "early b", "late"]);
    assert_eq!(ids(&store), vec![1, 2, 3]);
}

/// Test global and partial shifts clamp at zero
#[test]
fn test_shift_shouldMoveAndClamp() {
    let mut store = store_with(&[(1.0, 2.0), (5.0, 6.0)]);

    store.shift_all(-1.5).unwrap();
    assert_eq!((store.cues()[0].start, store.cues()[0].end), (0.0, 0.5));
    assert_eq!((store.cues()[1].start, store.cues()[1].end), (3.5, 4.5));

    let affected = store.shift_from(4.0, 10.0).unwrap();
    assert_eq!(affected, 1);
    assert_eq!((store.cues()[1].start, store.cues()[1].end), (3.5, 14.5));

    assert!(store.shift_all(f64::INFINITY).is_err());
}

/// Test stretching scales every bound
#[test]
fn test_stretch_shouldScaleTimes() {
    let mut store = store_with(&[(1.0, 2.0), (4.0, 8.0)]);

    store.stretch(1.5).unwrap();

    assert_eq!((store.cues()[1].start, store.cues()[1].end), (6.0, 12.0));
    assert!(store.stretch(0.0).is_err());
    assert!(store.stretch(-2.0).is_err());
}

/// Test repair of zero and negative durations uses the configured minimum
#[test]
fn test_fixNegativeDurations_shouldUseMinDuration() {
    let rules = TimingRules { min_duration: 2.0, ..TimingRules::default() };
    let mut store = CueStore::with_rules(rules);
    store.load(vec![
        Cue::new(1, 3.0, 1.0, "crossed"),
        Cue::new(2, 4.0, 4.0, "empty"),
        Cue::new(3, 5.0, 6.0, "fine"),
    ]);

    assert_eq!(store.fix_negative_durations(), 2);
    assert_eq!(store.cues()[0].end, 5.0);
    assert_eq!(store.cues()[1].end, 6.0);
    assert_eq!(store.cues()[2].end, 6.0);
}

/// Test lookup by playback position includes both bounds
#[test]
fn test_find_shouldIncludeBounds() {
    let store = store_with(&[(1.0, 2.0), (3.0, 4.0)]);

    assert_eq!(store.find(2.0).map(|(i, _)| i), Some(0));
    assert_eq!(store.find(3.0).map(|(i, _)| i), Some(1));
    assert!(store.find(2.5).is_none());
}

/// Test overlap resolution through the store uses its rules
#[test]
fn test_resolveOverlaps_shouldUseStoreGap() {
    let mut store = store_with(&[(0.0, 5.0), (3.0, 6.0)]);

    assert_eq!(store.overlaps().len(), 1);
    assert_eq!(store.resolve_overlaps(), 1);
    assert!((store.cues()[0].end - 2.9).abs() < 1e-9);
    assert!(store.overlaps().is_empty());
}

/// Test literal and regex replacement
#[test]
fn test_replaceText_shouldCountChangedCues() {
    let mut store = CueStore::from_cues(vec![
        Cue::new(1, 0.0, 1.0, "Hello world"),
        Cue::new(2, 1.0, 2.0, "hello again"),
        Cue::new(3, 2.0, 3.0, "nothing"),
    ]);

    assert_eq!(store.replace_text("hello", "Bye", SearchOptions::literal()).unwrap(), 2);
    assert_eq!(store.cues()[0].text, "Bye world");

    let changed = store
        .replace_text(r"(\w+) (\w+)", "$2 $1", SearchOptions::regex())
        .unwrap();
    assert_eq!(changed, 2);
    assert_eq!(store.cues()[1].text, "again Bye");

    assert_eq!(store.replace_text("", "x", SearchOptions::literal()).unwrap(), 0);
    assert!(store.replace_text("(", "x", SearchOptions::regex()).is_err());
}

/// Test speaker extraction moves the prefix into the speaker field
#[test]
fn test_extractSpeakers_shouldSplitPrefixes() {
    let mut store = CueStore::from_cues(vec![
        Cue::new(1, 0.0, 1.0, "Anna: Hi there"),
        Cue::new(2, 1.0, 2.0, "- Борис: Привет"),
        Cue::new(3, 2.0, 3.0, "no speaker here"),
    ]);

    let speakers = store.extract_speakers();

    assert_eq!(speakers.into_iter().collect::<Vec<_>>(), vec!["Anna".to_string(), "Борис".to_string()]);
    assert_eq!(store.cues()[0].text, "Hi there");
    assert_eq!(store.cues()[1].speaker.as_deref(), Some("Борис"));
    assert_eq!(store.cues()[2].speaker, None);
}

/// Test plain-text import interleaves with existing cues by start time
#[test]
fn test_importLines_shouldAppendSortAndRenumber() {
    let mut store = store_with(&[(4.0, 5.0)]);

    let count = store.import_lines("first\n\n  second  \n", 0.0, 2.0);

    assert_eq!(count, 2);
    let texts: Vec<&str> = store.cues().iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second", "cue 1"]);
    assert_eq!((store.cues()[1].start, store.cues()[1].end), (2.0, 4.0));
    assert_eq!(ids(&store), vec![1, 2, 3]);
}

/// Test inline styling through the store
#[test]
fn test_applyStyle_shouldWrapText() {
    let mut store = CueStore::from_cues(vec![Cue::new(1, 0.0, 1.0, "{\\i1}Hi{\\i0}")]);

    store.apply_style(0, Some(TextStyle::Bold), None).unwrap();

    assert_eq!(store.cues()[0].text, "{\\b1}Hi{\\b0}");
}

/// Test that ids stay dense and no cue ends before it starts across mixed edits
#[test]
fn test_mixedEdits_shouldKeepIdsDenseAndTimesOrdered() {
    fn assert_well_formed(store: &CueStore, step: &str) {
        let expected: Vec<usize> = (1..=store.len()).collect();
        assert_eq!(ids(store), expected, "ids after {}", step);
        for cue in store.cues() {
            assert!(cue.start <= cue.end, "cue {} inverted after {}", cue.id, step);
        }
    }

    let mut store = store_with(&[(0.0, 2.0), (2.2, 4.0), (10.0, 12.0)]);
    assert_well_formed(&store, "load");

    store.add(Some(20.0));
    assert_well_formed(&store, "add");

    store.insert_between(1).unwrap();
    assert_well_formed(&store, "insert between tight neighbours");

    store.delete(0).unwrap();
    assert_well_formed(&store, "delete");

    store.add(None);
    assert_well_formed(&store, "add at zero");

    let end = store.len();
    store.insert_between(end).unwrap();
    assert_well_formed(&store, "insert at end");

    store.insert_between(0).unwrap();
    assert_well_formed(&store, "insert at front");

    store.sort_by_start();
    assert_well_formed(&store, "sort");
    assert!(store.cues().windows(2).all(|w| w[0].start <= w[1].start));
}
