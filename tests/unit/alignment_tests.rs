/*!
 * Tests for timestamp alignment functionality
 */

use subguide::alignment::{Aligner, Event, DEFAULT_BOUNDARY_TOLERANCE};
use subguide::errors::AlignmentError;
use subguide::reflow::Segment;

fn segment(start_secs: u64, end_secs: u64) -> Segment {
    Segment {
        start_ms: start_secs * 1000,
        end_ms: end_secs * 1000,
        text: String::new(),
        source_count: 1,
    }
}

/// Three segments with a gap between the second and third
fn sample_segments() -> Vec<Segment> {
    vec![segment(10, 20), segment(20, 30), segment(40, 50)]
}

/// Test that a time inside a segment maps to that segment
#[test]
fn test_align_event_withContainedTime_shouldPickContainingSegment() {
    let aligner = Aligner::new();
    let segments = sample_segments();

    assert_eq!(aligner.align_event(15_000, &segments), Some(0));
    assert_eq!(aligner.align_event(45_000, &segments), Some(2));
}

/// Test that interval ends are exclusive and starts inclusive
#[test]
fn test_align_event_withBoundaryTime_shouldTreatEndAsExclusive() {
    let aligner = Aligner::new();
    let segments = sample_segments();

    // 20s is the end of segment 0 and the start of segment 1
    assert_eq!(aligner.align_event(20_000, &segments), Some(1));
    assert_eq!(aligner.align_event(10_000, &segments), Some(0));
}

/// Test that a segment start within tolerance wins over the preceding segment
#[test]
fn test_align_event_withTimeNearSegmentStart_shouldSnapToThatSegment() {
    let aligner = Aligner::new();
    let segments = sample_segments();

    // 39.95s sits in the gap, 50ms before segment 2 starts; without the
    // tolerance it would fall back to segment 1, which ended at 30s
    assert_eq!(aligner.align_event(39_950, &segments), Some(2));
}

/// Test that the tolerance window is tunable
#[test]
fn test_align_event_withWiderTolerance_shouldWidenTheSnapWindow() {
    let segments = sample_segments();

    // 800ms before segment 2 starts
    let default_aligner = Aligner::new();
    assert_eq!(default_aligner.align_event(39_200, &segments), Some(1));

    let wide_aligner = Aligner::with_tolerance(1.0).unwrap();
    assert_eq!(wide_aligner.align_event(39_200, &segments), Some(2));
}

/// Test the edge of the default tolerance window
#[test]
fn test_align_event_atToleranceEdge_shouldIncludeExactDistance() {
    let aligner = Aligner::new();
    let segments = vec![segment(10, 20)];

    // Exactly 100ms before the start is still within tolerance
    assert_eq!(aligner.align_event(9_900, &segments), Some(0));
    // One more millisecond out is unassigned
    assert_eq!(aligner.align_event(9_899, &segments), None);
}

/// Test the nearest-preceding fallback for times in gaps and past the end
#[test]
fn test_align_event_withTimeInGap_shouldPickNearestPrecedingSegment() {
    let aligner = Aligner::new();
    let segments = sample_segments();

    // 35s is between segment 1 (ended 30s) and segment 2 (starts 40s)
    assert_eq!(aligner.align_event(35_000, &segments), Some(1));
    // 55s is past everything, the last segment is nearest
    assert_eq!(aligner.align_event(55_000, &segments), Some(2));
}

/// Test that a time before the first segment stays unassigned
#[test]
fn test_align_event_withTimeBeforeFirstSegment_shouldReturnNone() {
    let aligner = Aligner::new();
    let segments = sample_segments();

    assert_eq!(aligner.align_event(5_000, &segments), None);
}

/// Test that no segments means no assignment
#[test]
fn test_align_event_withNoSegments_shouldReturnNone() {
    let aligner = Aligner::new();
    assert_eq!(aligner.align_event(15_000, &[]), None);
}

/// Test aligning a batch of events preserves order and count
#[test]
fn test_align_withEventBatch_shouldReturnOneAssignmentPerEvent() {
    let aligner = Aligner::new();
    let segments = sample_segments();
    let events = vec![
        Event::new(15_000, "Grid"),
        Event::new(5_000, "Mountain"),
        Event::new(35_000, "Merge"),
    ];

    let assignments = aligner.align(&events, &segments);

    assert_eq!(assignments, vec![Some(0), None, Some(1)]);
}

/// Test that alignment is deterministic
#[test]
fn test_align_withIdenticalInput_shouldReturnIdenticalMapping() {
    let aligner = Aligner::new();
    let segments = sample_segments();
    let events: Vec<Event> = (0..20)
        .map(|i| Event::new(i * 3_000, format!("event_{}", i)))
        .collect();

    let first = aligner.align(&events, &segments);
    let second = aligner.align(&events, &segments);

    assert_eq!(first, second);
}

/// Test tolerance validation
#[test]
fn test_with_tolerance_withInvalidValues_shouldReturnError() {
    assert!(matches!(
        Aligner::with_tolerance(-0.5),
        Err(AlignmentError::InvalidTolerance(_))
    ));
    assert!(matches!(
        Aligner::with_tolerance(f64::NAN),
        Err(AlignmentError::InvalidTolerance(_))
    ));

    // Zero disables the snap window but is a legal setting
    let strict = Aligner::with_tolerance(0.0).unwrap();
    assert_eq!(strict.boundary_tolerance_ms(), 0);
}

/// Test that the default tolerance matches the documented constant
#[test]
fn test_new_shouldUseDefaultBoundaryTolerance() {
    let aligner = Aligner::new();
    assert_eq!(
        aligner.boundary_tolerance_ms(),
        (DEFAULT_BOUNDARY_TOLERANCE * 1000.0) as u64
    );
}

/// Test regrouping assignments into per-segment lists
#[test]
fn test_group_by_segment_withMixedAssignments_shouldGroupEventIndices() {
    let assignments = vec![Some(0), None, Some(1), Some(0)];

    let grouped = Aligner::group_by_segment(&assignments, 3);

    assert_eq!(grouped.len(), 3);
    assert_eq!(grouped[0], vec![0, 3]);
    assert_eq!(grouped[1], vec![2]);
    assert!(grouped[2].is_empty());
}
