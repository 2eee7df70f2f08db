/*!
 * Caption re-flowing.
 *
 * Merges short caption cues into longer segments that approximate a target
 * duration, preferring to cut at sentence boundaries. A single greedy forward
 * pass with no backtracking; the output partitions the input (every cue lands
 * in exactly one segment, in source order).
 */

use std::fmt;
use std::time::Duration;

use log::{debug, error, info};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ReflowError;
use crate::subtitle_processor::SubtitleEntry;

static WHITESPACE_RUN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Characters that end a sentence
const SENTENCE_ENDINGS: [char; 3] = ['.', '!', '?'];

/// A re-flowed caption segment covering one or more source cues
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Start of the first constituent cue, in ms
    pub start_ms: u64,

    /// End of the last constituent cue, in ms
    pub end_ms: u64,

    /// Normalized, joined cue text
    pub text: String,

    /// Number of source cues merged into this segment
    pub source_count: usize,
}

impl Segment {
    /// Segment duration in seconds
    pub fn duration_secs(&self) -> f64 {
        (self.end_ms.saturating_sub(self.start_ms)) as f64 / 1000.0
    }
}

impl From<&SubtitleEntry> for Segment {
    /// View a parsed subtitle entry as a single-cue segment, for alignment
    /// against already re-flowed files
    fn from(entry: &SubtitleEntry) -> Self {
        Segment {
            start_ms: entry.start_time_ms,
            end_ms: entry.end_time_ms,
            text: entry.text.clone(),
            source_count: 1,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{} --> {}] {}",
            SubtitleEntry::format_timestamp(self.start_ms),
            SubtitleEntry::format_timestamp(self.end_ms),
            self.text
        )
    }
}

/// Statistics for one re-flow pass
#[derive(Debug, Clone, Default)]
pub struct ReflowStats {
    /// Cue count before re-flowing
    pub original_segments: usize,

    /// Segment count after re-flowing
    pub fixed_segments: usize,

    /// Average cue duration before, in seconds
    pub avg_original_duration: f64,

    /// Average segment duration after, in seconds
    pub avg_fixed_duration: f64,

    /// Wall time spent in the pass
    pub processing_time: Duration,
}

impl ReflowStats {
    /// Compute stats from the input cues and the produced segments
    pub fn from_pass(cues: &[SubtitleEntry], segments: &[Segment], processing_time: Duration) -> Self {
        let avg_original_duration = if cues.is_empty() {
            0.0
        } else {
            let total: u64 = cues
                .iter()
                .map(|c| c.end_time_ms.saturating_sub(c.start_time_ms))
                .sum();
            total as f64 / 1000.0 / cues.len() as f64
        };

        let avg_fixed_duration = if segments.is_empty() {
            0.0
        } else {
            let total: u64 = segments
                .iter()
                .map(|s| s.end_ms.saturating_sub(s.start_ms))
                .sum();
            total as f64 / 1000.0 / segments.len() as f64
        };

        ReflowStats {
            original_segments: cues.len(),
            fixed_segments: segments.len(),
            avg_original_duration,
            avg_fixed_duration,
            processing_time,
        }
    }

    /// One-line summary for the run log
    pub fn summary(&self) -> String {
        format!(
            "{} -> {} segments (avg {:.1}s -> {:.1}s) in {:.2}s",
            self.original_segments,
            self.fixed_segments,
            self.avg_original_duration,
            self.avg_fixed_duration,
            self.processing_time.as_secs_f64()
        )
    }
}

/// Validate re-flow parameters before touching any input.
///
/// A non-positive or non-finite target duration and a completion threshold
/// outside [0, 1] are caller contract violations.
pub fn validate_params(target_duration: f64, completion_threshold: f64) -> Result<(), ReflowError> {
    if !target_duration.is_finite() || target_duration <= 0.0 {
        return Err(ReflowError::InvalidTargetDuration(target_duration));
    }
    if !completion_threshold.is_finite() || !(0.0..=1.0).contains(&completion_threshold) {
        return Err(ReflowError::InvalidCompletionThreshold(completion_threshold));
    }
    Ok(())
}

/// Re-flow cues into duration-targeted segments.
///
/// `target_duration` is the hard cap in seconds. A group also closes early at
/// a sentence boundary once it reaches `target_duration * completion_threshold`.
/// The cue that triggers a close starts the next group; the final group is
/// flushed even if it never reached the threshold. Empty input produces empty
/// output.
pub fn reflow(
    cues: &[SubtitleEntry],
    target_duration: f64,
    completion_threshold: f64,
) -> Result<Vec<Segment>, ReflowError> {
    validate_params(target_duration, completion_threshold)?;

    if cues.is_empty() {
        return Ok(Vec::new());
    }

    info!(
        "Re-flowing {} cues (target {}s, completion threshold {:.0}%)",
        cues.len(),
        target_duration,
        completion_threshold * 100.0
    );

    let early_break_at = target_duration * completion_threshold;
    let mut segments = Vec::new();
    let mut group: Vec<&SubtitleEntry> = Vec::new();
    let mut group_start_ms = 0u64;
    let mut group_end_ms = 0u64;

    for cue in cues {
        if group.is_empty() {
            group.push(cue);
            group_start_ms = cue.start_time_ms;
            group_end_ms = cue.end_time_ms;
            continue;
        }

        let potential_duration = cue.end_time_ms.saturating_sub(group_start_ms) as f64 / 1000.0;

        let last_text = group[group.len() - 1].text.trim_end();
        let sentence_complete = last_text.ends_with(SENTENCE_ENDINGS);

        let should_close = potential_duration >= target_duration
            || (sentence_complete && potential_duration >= early_break_at);

        if should_close {
            segments.push(close_group(&group, group_start_ms, group_end_ms));

            group.clear();
            group.push(cue);
            group_start_ms = cue.start_time_ms;
            group_end_ms = cue.end_time_ms;
        } else {
            group.push(cue);
            group_end_ms = cue.end_time_ms;
        }
    }

    // Flush the final, possibly short, group
    if !group.is_empty() {
        segments.push(close_group(&group, group_start_ms, group_end_ms));
    }

    // Every input cue must land in exactly one segment
    let merged_count: usize = segments.iter().map(|s| s.source_count).sum();
    if merged_count != cues.len() {
        error!(
            "Re-flow lost cues: {} in, {} accounted for across {} segments",
            cues.len(),
            merged_count,
            segments.len()
        );
    } else {
        debug!("Re-flowed {} cues into {} segments", cues.len(), segments.len());
    }

    Ok(segments)
}

/// Emit a segment from the accumulated group
fn close_group(group: &[&SubtitleEntry], start_ms: u64, end_ms: u64) -> Segment {
    let joined = group
        .iter()
        .map(|cue| cue.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    Segment {
        start_ms,
        end_ms,
        text: normalize_text(&joined),
        source_count: group.len(),
    }
}

/// Normalize segment text: collapse whitespace runs, trim, and terminate the
/// sentence if nothing else does. Applying this twice equals applying it once.
pub fn normalize_text(text: &str) -> String {
    let collapsed = WHITESPACE_RUN_REGEX.replace_all(text, " ");
    let mut normalized = collapsed.trim().to_string();

    if !normalized.is_empty() && !normalized.ends_with(SENTENCE_ENDINGS) {
        normalized.push('.');
    }

    normalized
}
