/*!
 * Event-to-segment alignment.
 *
 * Places discrete timestamped events (node mentions) against re-flowed
 * caption segments. Matching prefers the containing `[start, end)` interval,
 * then a segment start within the boundary tolerance, then the nearest
 * segment that already ended. Events before the first segment stay
 * unassigned, which is an expected outcome rather than an error.
 */

use log::debug;
use serde_json::Value;

use crate::errors::AlignmentError;
use crate::reflow::Segment;
use crate::subtitle_processor::SubtitleEntry;

/// Default tolerance around a segment start, in seconds
pub const DEFAULT_BOUNDARY_TOLERANCE: f64 = 0.1;

/// A point-in-time marker to be attached to a segment
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event time in ms
    pub time_ms: u64,

    /// Opaque identifier, e.g. a node name
    pub label: String,

    /// Caller data carried through alignment untouched
    pub payload: Value,
}

impl Event {
    /// Create an event with an empty payload
    pub fn new(time_ms: u64, label: impl Into<String>) -> Self {
        Event {
            time_ms,
            label: label.into(),
            payload: Value::Null,
        }
    }

    /// Attach a payload
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} @ {}",
            self.label,
            SubtitleEntry::format_timestamp_short(self.time_ms)
        )
    }
}

/// Assigns events to segments.
///
/// The boundary tolerance is tunable; narrators announce nodes slightly after
/// the caption that introduces them, or exactly at a caption boundary when
/// the stamps were pre-computed, and capture pipelines disagree on how wide
/// that boundary slack should be.
#[derive(Debug, Clone)]
pub struct Aligner {
    boundary_tolerance_ms: u64,
}

impl Default for Aligner {
    fn default() -> Self {
        Aligner::new()
    }
}

impl Aligner {
    /// Aligner with the default 0.1s boundary tolerance
    pub fn new() -> Self {
        Aligner {
            boundary_tolerance_ms: (DEFAULT_BOUNDARY_TOLERANCE * 1000.0).round() as u64,
        }
    }

    /// Aligner with an explicit boundary tolerance in seconds
    pub fn with_tolerance(tolerance_secs: f64) -> Result<Self, AlignmentError> {
        if !tolerance_secs.is_finite() || tolerance_secs < 0.0 {
            return Err(AlignmentError::InvalidTolerance(tolerance_secs));
        }

        Ok(Aligner {
            boundary_tolerance_ms: (tolerance_secs * 1000.0).round() as u64,
        })
    }

    /// Boundary tolerance in milliseconds
    pub fn boundary_tolerance_ms(&self) -> u64 {
        self.boundary_tolerance_ms
    }

    /// Assign each event to at most one segment.
    ///
    /// Returns one entry per input event, in order: the index of the segment
    /// the event belongs to, or `None` when the event precedes the first
    /// segment. Re-running on identical input yields an identical mapping.
    pub fn align(&self, events: &[Event], segments: &[Segment]) -> Vec<Option<usize>> {
        let assignments: Vec<Option<usize>> = events
            .iter()
            .map(|event| self.align_event(event.time_ms, segments))
            .collect();

        let unassigned = assignments.iter().filter(|a| a.is_none()).count();
        debug!(
            "Aligned {} events against {} segments ({} unassigned)",
            events.len(),
            segments.len(),
            unassigned
        );

        assignments
    }

    /// Place a single event time against the segments
    pub fn align_event(&self, time_ms: u64, segments: &[Segment]) -> Option<usize> {
        // Containing interval wins outright
        if let Some(idx) = segments
            .iter()
            .position(|s| s.start_ms <= time_ms && time_ms < s.end_ms)
        {
            return Some(idx);
        }

        // A start boundary within tolerance takes precedence over the
        // distance-based fallback
        let mut boundary_match: Option<(usize, u64)> = None;
        for (idx, segment) in segments.iter().enumerate() {
            let distance = time_ms.abs_diff(segment.start_ms);
            if distance <= self.boundary_tolerance_ms {
                match boundary_match {
                    Some((_, best)) if best <= distance => {}
                    _ => boundary_match = Some((idx, distance)),
                }
            }
        }
        if let Some((idx, _)) = boundary_match {
            return Some(idx);
        }

        // Nearest preceding segment: the event happened shortly after it ended
        let mut preceding: Option<(usize, u64)> = None;
        for (idx, segment) in segments.iter().enumerate() {
            if segment.end_ms <= time_ms {
                let gap = time_ms - segment.end_ms;
                match preceding {
                    Some((_, best)) if best <= gap => {}
                    _ => preceding = Some((idx, gap)),
                }
            }
        }

        preceding.map(|(idx, _)| idx)
    }

    /// Regroup per-event assignments into per-segment event index lists
    pub fn group_by_segment(assignments: &[Option<usize>], segment_count: usize) -> Vec<Vec<usize>> {
        let mut grouped = vec![Vec::new(); segment_count];
        for (event_idx, assignment) in assignments.iter().enumerate() {
            if let Some(segment_idx) = *assignment {
                if segment_idx < segment_count {
                    grouped[segment_idx].push(event_idx);
                }
            }
        }
        grouped
    }
}
