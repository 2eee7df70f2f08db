/*!
 * Tests for SRT parsing, rendering and timestamp handling
 */

use std::path::PathBuf;
use std::fmt::Write;
use anyhow::Result;
use subguide::subtitle_processor::{SubtitleEntry, SubtitleCollection};
use subguide::reflow::Segment;
use crate::common;

/// Test that a full timestamp survives a parse and format cycle
#[test]
fn test_timestamp_parsing_withValidTimestamp_shouldParseAndFormat() {
    let ts = "01:23:45,678";
    let ms = SubtitleEntry::parse_timestamp(ts).unwrap();
    assert_eq!(ms, 5025678);

    let formatted = SubtitleEntry::format_timestamp(ms);
    assert_eq!(formatted, ts);
}

/// Test flexible timestamp parsing without a millisecond part
#[test]
fn test_timestamp_parsing_withBareClockStamp_shouldAssumeZeroMillis() {
    let ms = SubtitleEntry::parse_timestamp_flexible("00:45:16").unwrap();
    assert_eq!(ms, 45 * 60_000 + 16_000);

    // Full stamps still parse the same way
    let full = SubtitleEntry::parse_timestamp_flexible("00:45:16,250").unwrap();
    assert_eq!(full, 45 * 60_000 + 16_250);
}

/// Test short clock formatting used by guide headings
#[test]
fn test_format_timestamp_short_withVariousTimes_shouldDropMillis() {
    assert_eq!(SubtitleEntry::format_timestamp_short(0), "00:00:00");
    assert_eq!(SubtitleEntry::format_timestamp_short(45_678), "00:00:45");
    assert_eq!(SubtitleEntry::format_timestamp_short(3_725_000), "01:02:05");
}

/// Test that Display renders an entry as an SRT block
#[test]
fn test_subtitle_entry_display_withValidEntry_shouldFormatCorrectly() {
    let entry = SubtitleEntry::new(1, 5000, 10000, "Test subtitle".to_string());
    let mut output = String::new();
    write!(output, "{}", entry).unwrap();

    assert!(output.contains("1"));
    assert!(output.contains("00:00:05,000"));
    assert!(output.contains("00:00:10,000"));
    assert!(output.contains("Test subtitle"));
}

/// Test entry validation rejects inverted ranges and empty text
#[test]
fn test_new_validated_withBadEntries_shouldReturnError() {
    assert!(SubtitleEntry::new_validated(1, 5000, 5000, "text".to_string()).is_err());
    assert!(SubtitleEntry::new_validated(1, 5000, 4000, "text".to_string()).is_err());
    assert!(SubtitleEntry::new_validated(1, 0, 1000, "   ".to_string()).is_err());
}

/// Test collection bookkeeping with hand-built entries
#[test]
fn test_in_memory_subtitle_collection_withValidEntries_shouldStoreCorrectly() {
    let source_file = PathBuf::from("transcript_1096045116.srt");
    let mut collection = SubtitleCollection::new(source_file.clone(), "en".to_string());

    collection.entries.push(SubtitleEntry::new(
        1, 0, 5000, "First subtitle".to_string()
    ));
    collection.entries.push(SubtitleEntry::new(
        2, 5500, 10000, "Second subtitle".to_string()
    ));

    assert_eq!(collection.source_file, source_file);
    assert_eq!(collection.source_language, "en");
    assert_eq!(collection.entries.len(), 2);
    assert_eq!(collection.skipped_entries, 0);
    assert_eq!(collection.total_duration_ms(), 10000);
}

/// Test parsing round trip through SRT text
#[test]
fn test_parse_srt_string_withValidContent_shouldRoundTrip() -> Result<()> {
    let mut collection = SubtitleCollection::new(PathBuf::from("test.srt"), "en".to_string());
    collection.entries.push(SubtitleEntry::new(1, 0, 5000, "First.".to_string()));
    collection.entries.push(SubtitleEntry::new(2, 5500, 10000, "Second.".to_string()));

    let rendered = collection.to_srt_string();
    let parsed = SubtitleCollection::parse_srt_string(&rendered)?;

    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].text, "First.");
    assert_eq!(parsed[1].start_time_ms, 5500);

    Ok(())
}

/// Test that malformed blocks are skipped and counted, not fatal
#[test]
fn test_from_srt_string_withMalformedBlock_shouldSkipAndCount() -> Result<()> {
    let content = "1\n00:00:01,000 --> 00:00:04,000\nGood entry.\n\n2\nbroken --> timestamp\nBad entry.\n\n3\n00:00:10,000 --> 00:00:14,000\nAnother good one.\n";

    let collection =
        SubtitleCollection::from_srt_string(content, PathBuf::from("test.srt"), "en")?;

    assert_eq!(collection.entries.len(), 2);
    assert_eq!(collection.skipped_entries, 1);
    // Entries are renumbered sequentially after the drop
    assert_eq!(collection.entries[1].seq_num, 2);

    Ok(())
}

/// Test that multi-line cue text reads as one space-joined line
#[test]
fn test_from_srt_string_withMultiLineCue_shouldJoinWithSpaces() -> Result<()> {
    let content = "1\n00:00:01,000 --> 00:00:04,000\nfirst line\nsecond line\n";

    let collection =
        SubtitleCollection::from_srt_string(content, PathBuf::from("test.srt"), "en")?;

    assert_eq!(collection.entries.len(), 1);
    assert_eq!(collection.entries[0].text, "first line second line");

    Ok(())
}

/// Test that fully empty content parses as an empty stream
#[test]
fn test_from_srt_string_withWhitespaceOnly_shouldBeEmpty() -> Result<()> {
    let collection = SubtitleCollection::from_srt_string("  \n\n  ", PathBuf::from("e.srt"), "en")?;

    assert!(collection.entries.is_empty());
    assert_eq!(collection.skipped_entries, 0);

    Ok(())
}

/// Test that content with no valid entry at all is an error
#[test]
fn test_from_srt_string_withNoValidEntries_shouldReturnError() {
    let result =
        SubtitleCollection::from_srt_string("garbage\nmore garbage", PathBuf::from("g.srt"), "en");

    assert!(result.is_err());
}

/// Test sanitizing the escaped blob the browser capture step produces
#[test]
fn test_sanitize_captured_content_withEscapedBlob_shouldRestorePlainSrt() -> Result<()> {
    let captured = "\"1\\n00:00:01,000 --> 00:00:04,000\\nCaptured text.\\n\"";

    let collection =
        SubtitleCollection::from_srt_string(captured, PathBuf::from("captured.srt"), "en")?;

    assert_eq!(collection.entries.len(), 1);
    assert_eq!(collection.entries[0].text, "Captured text.");

    Ok(())
}

/// Test that out-of-order entries get sorted by start time
#[test]
fn test_from_srt_string_withOutOfOrderEntries_shouldSortByStartTime() -> Result<()> {
    let content = "2\n00:00:10,000 --> 00:00:14,000\nSecond.\n\n1\n00:00:01,000 --> 00:00:04,000\nFirst.\n";

    let collection =
        SubtitleCollection::from_srt_string(content, PathBuf::from("test.srt"), "en")?;

    assert_eq!(collection.entries[0].text, "First.");
    assert_eq!(collection.entries[0].seq_num, 1);
    assert_eq!(collection.entries[1].text, "Second.");

    Ok(())
}

/// Test building a renumbered collection from re-flowed segments
#[test]
fn test_from_segments_withSegments_shouldRenumberFromOne() {
    let segments = vec![
        Segment { start_ms: 0, end_ms: 12_000, text: "Merged one.".to_string(), source_count: 3 },
        Segment { start_ms: 12_000, end_ms: 30_000, text: "Merged two.".to_string(), source_count: 4 },
    ];

    let collection =
        SubtitleCollection::from_segments(&segments, PathBuf::from("fixed.srt"), "en");

    assert_eq!(collection.entries.len(), 2);
    assert_eq!(collection.entries[0].seq_num, 1);
    assert_eq!(collection.entries[1].seq_num, 2);
    assert_eq!(collection.entries[1].text, "Merged two.");
}

/// Test loading from a file on disk
#[test]
fn test_from_srt_file_withSampleFile_shouldLoadEntries() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let subtitle_file =
        common::create_test_subtitle(&temp_dir.path().to_path_buf(), "sample.srt")?;

    let collection = SubtitleCollection::from_srt_file(&subtitle_file, "en")?;

    assert_eq!(collection.entries.len(), 3);
    assert_eq!(collection.entries[0].text, "This is a test subtitle.");

    Ok(())
}
