/*!
 * Tests for overlap detection and resolution
 */

use subedit::cue::Cue;
use subedit::overlap::OverlapResolver;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Test that only adjacent pairs running into each other are reported
#[test]
fn test_detect_withMixedPairs_shouldReportOverlapsOnly() {
    let cues = vec![
        Cue::new(1, 0.0, 3.0, "a"),
        Cue::new(2, 2.0, 4.0, "b"),
        Cue::new(3, 4.0, 5.0, "c"),
    ];

    let overlaps = OverlapResolver::detect(&cues);

    assert_eq!(overlaps.len(), 1);
    assert_eq!((overlaps[0].first_index, overlaps[0].second_index), (0, 1));
    assert!(approx(overlaps[0].overlap_seconds, 1.0));
}

/// Test that resolution leaves the default gap before the next cue
#[test]
fn test_resolve_withDefaultGap_shouldEndBeforeNextStart() {
    let cues = vec![Cue::new(1, 0.0, 5.0, "a"), Cue::new(2, 3.0, 6.0, "b")];

    let resolved = OverlapResolver::new().resolve(&cues);

    assert!(approx(resolved[0].end, 2.9));
    assert_eq!(resolved[1], cues[1]);
    assert!(OverlapResolver::detect(&resolved).is_empty());
}

/// Test that a cue is never shortened below its own start
#[test]
fn test_resolve_withSameStart_shouldClampToOwnStart() {
    let cues = vec![Cue::new(1, 2.0, 5.0, "a"), Cue::new(2, 2.0, 6.0, "b")];

    let resolved = OverlapResolver::new().resolve(&cues);

    assert_eq!(resolved[0].end, 2.0);
    assert!(resolved[0].end >= resolved[0].start);
}

/// Test that resolving twice changes nothing the second time
#[test]
fn test_resolveInPlace_calledTwice_shouldBeIdempotent() {
    let mut cues = vec![
        Cue::new(1, 0.0, 5.0, "a"),
        Cue::new(2, 3.0, 8.0, "b"),
        Cue::new(3, 7.0, 9.0, "c"),
    ];
    let resolver = OverlapResolver::with_gap(0.25);

    assert_eq!(resolver.resolve_in_place(&mut cues), 2);
    let once = cues.clone();
    assert_eq!(resolver.resolve_in_place(&mut cues), 0);
    assert_eq!(cues, once);
}

/// Test that invalid gaps fall back to sane values
#[test]
fn test_withGap_withInvalidValues_shouldSanitize() {
    assert_eq!(OverlapResolver::with_gap(-1.0).gap(), 0.0);
    assert_eq!(OverlapResolver::with_gap(f64::NAN).gap(), 0.1);
}
