/*!
 * Tests for caption re-flow functionality
 */

use std::time::Duration;
use subguide::errors::ReflowError;
use subguide::reflow::{reflow, normalize_text, validate_params, ReflowStats, Segment};
use subguide::subtitle_processor::SubtitleEntry;

fn cue(seq: usize, start_secs: u64, end_secs: u64, text: &str) -> SubtitleEntry {
    SubtitleEntry::new(seq, start_secs * 1000, end_secs * 1000, text.to_string())
}

/// Test that short cues merge into one segment below the target
#[test]
fn test_reflow_withShortCues_shouldMergeIntoOneSegment() {
    let cues = vec![
        cue(1, 0, 5, "hello there"),
        cue(2, 5, 10, "this is"),
        cue(3, 10, 15, "a test."),
    ];

    let segments = reflow(&cues, 40.0, 0.8).unwrap();

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].start_ms, 0);
    assert_eq!(segments[0].end_ms, 15_000);
    assert_eq!(segments[0].text, "hello there this is a test.");
    assert_eq!(segments[0].source_count, 3);
}

/// Test that the hard duration cap closes groups, with the triggering cue
/// starting the next group
#[test]
fn test_reflow_withTargetReached_shouldStartNextGroupWithTriggeringCue() {
    let cues = vec![
        cue(1, 0, 6, "first part"),
        cue(2, 6, 12, "second part"),
        cue(3, 12, 18, "third."),
    ];

    // Adding cue 2 would make the group 12s long, over the 10s target
    let segments = reflow(&cues, 10.0, 0.8).unwrap();

    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0].end_ms, 6_000);
    assert_eq!(segments[1].start_ms, 6_000);
    assert_eq!(segments[1].end_ms, 12_000);
    assert_eq!(segments[2].start_ms, 12_000);
    assert!(segments.iter().all(|s| s.source_count == 1));
}

/// Test the early close at a sentence boundary past the completion threshold
#[test]
fn test_reflow_withCompletedSentence_shouldCloseEarlyAtThreshold() {
    let cues = vec![
        cue(1, 0, 20, "intro sentence one."),
        cue(2, 20, 34, "more text"),
        cue(3, 34, 40, "continues here."),
    ];

    // 34s potential >= 40 * 0.8 = 32s and the group text ends a sentence,
    // so the group closes before reaching the 40s target
    let segments = reflow(&cues, 40.0, 0.8).unwrap();

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].text, "intro sentence one.");
    assert_eq!(segments[0].source_count, 1);
    assert_eq!(segments[1].start_ms, 20_000);
    assert_eq!(segments[1].text, "more text continues here.");
}

/// Test that the threshold alone, without a sentence ending, does not close
#[test]
fn test_reflow_withIncompleteSentence_shouldIgnoreThreshold() {
    let cues = vec![
        cue(1, 0, 20, "intro sentence one"),
        cue(2, 20, 34, "more text"),
        cue(3, 34, 40, "continues here."),
    ];

    let segments = reflow(&cues, 40.0, 0.8).unwrap();

    // Without the period the group only closes at the 40s hard cap
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].source_count, 2);
    assert_eq!(segments[0].end_ms, 34_000);
    assert_eq!(segments[1].source_count, 1);
}

/// Test that the final group is flushed even when it stays short
#[test]
fn test_reflow_withShortTail_shouldFlushFinalGroup() {
    let cues = vec![
        cue(1, 0, 39, "a long opening segment without an ending"),
        cue(2, 39, 41, "tail"),
    ];

    let segments = reflow(&cues, 40.0, 0.8).unwrap();

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[1].text, "tail.");
    assert_eq!(segments[1].duration_secs(), 2.0);
}

/// Test whitespace normalization and sentence termination of merged text
#[test]
fn test_reflow_withRaggedText_shouldNormalizeJoinedText() {
    let cues = vec![
        cue(1, 0, 2, "hello\n  world"),
        cue(2, 2, 41, "again  now"),
    ];

    let segments = reflow(&cues, 40.0, 0.8).unwrap();

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].text, "hello world.");
    assert_eq!(segments[1].text, "again now.");
}

/// Test that empty input produces empty output, not an error
#[test]
fn test_reflow_withEmptyInput_shouldReturnEmptyOutput() {
    let segments = reflow(&[], 40.0, 0.8).unwrap();
    assert!(segments.is_empty());
}

/// Test that a single cue survives as a single segment
#[test]
fn test_reflow_withSingleCue_shouldReturnSingleSegment() {
    let cues = vec![cue(1, 3, 8, "only one cue here.")];

    let segments = reflow(&cues, 40.0, 0.8).unwrap();

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].start_ms, 3_000);
    assert_eq!(segments[0].end_ms, 8_000);
    assert_eq!(segments[0].source_count, 1);
}

/// Test that every cue lands in exactly one segment
#[test]
fn test_reflow_withManyCues_shouldPartitionAllCues() {
    let cues: Vec<SubtitleEntry> = (0..50)
        .map(|i| {
            let text = if i % 7 == 0 { "sentence ends." } else { "still going" };
            cue(i + 1, (i * 4) as u64, (i * 4 + 4) as u64, text)
        })
        .collect();

    let segments = reflow(&cues, 40.0, 0.8).unwrap();

    let total: usize = segments.iter().map(|s| s.source_count).sum();
    assert_eq!(total, cues.len());

    // Segments tile the timeline in order without gaps
    for pair in segments.windows(2) {
        assert_eq!(pair[0].end_ms, pair[1].start_ms);
    }
}

/// Test parameter validation failures
#[test]
fn test_reflow_withInvalidParameters_shouldRejectBeforeProcessing() {
    let cues = vec![cue(1, 0, 5, "text.")];

    assert!(matches!(
        reflow(&cues, 0.0, 0.8),
        Err(ReflowError::InvalidTargetDuration(_))
    ));
    assert!(matches!(
        reflow(&cues, -5.0, 0.8),
        Err(ReflowError::InvalidTargetDuration(_))
    ));
    assert!(matches!(
        reflow(&cues, f64::NAN, 0.8),
        Err(ReflowError::InvalidTargetDuration(_))
    ));
    assert!(matches!(
        reflow(&cues, 40.0, 1.5),
        Err(ReflowError::InvalidCompletionThreshold(_))
    ));
    assert!(matches!(
        reflow(&cues, 40.0, -0.1),
        Err(ReflowError::InvalidCompletionThreshold(_))
    ));
}

/// Test that validate_params accepts the threshold interval endpoints
#[test]
fn test_validate_params_withBoundaryValues_shouldAccept() {
    assert!(validate_params(40.0, 0.0).is_ok());
    assert!(validate_params(40.0, 1.0).is_ok());
    assert!(validate_params(0.1, 0.8).is_ok());
}

/// Test text normalization behavior in isolation
#[test]
fn test_normalize_text_withVariousInputs_shouldCollapseAndTerminate() {
    assert_eq!(normalize_text("  hello   world  "), "hello world.");
    assert_eq!(normalize_text("already done."), "already done.");
    assert_eq!(normalize_text("question?"), "question?");
    assert_eq!(normalize_text("exclaim!"), "exclaim!");
    assert_eq!(normalize_text(""), "");
    assert_eq!(normalize_text("   "), "");
    // Applying it twice changes nothing
    let once = normalize_text("line\none  two");
    assert_eq!(normalize_text(&once), once);
}

/// Test re-flow statistics computation
#[test]
fn test_reflowStats_fromPass_shouldComputeAverages() {
    let cues = vec![cue(1, 0, 2, "a"), cue(2, 2, 4, "b.")];
    let segments = vec![Segment {
        start_ms: 0,
        end_ms: 4_000,
        text: "a b.".to_string(),
        source_count: 2,
    }];

    let stats = ReflowStats::from_pass(&cues, &segments, Duration::from_millis(15));

    assert_eq!(stats.original_segments, 2);
    assert_eq!(stats.fixed_segments, 1);
    assert!((stats.avg_original_duration - 2.0).abs() < f64::EPSILON);
    assert!((stats.avg_fixed_duration - 4.0).abs() < f64::EPSILON);
    assert!(stats.summary().contains("2 -> 1 segments"));
}
