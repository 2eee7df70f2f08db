use std::fs;
use std::fmt;
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Result, Context, anyhow};
use std::path::{Path, PathBuf};
use log::{debug, warn};

use crate::errors::SubtitleError;
use crate::reflow::Segment;

// @module: SRT subtitle parsing and manipulation

// @const: SRT `start --> end` line
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}):(\d{2}):(\d{2}),(\d{3}) --> (\d{2}):(\d{2}):(\d{2}),(\d{3})").unwrap()
});

// @const: Characters that never belong on a timestamp line
static TIMESTAMP_NOISE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\d:,>\-\s]").unwrap()
});

// @const: Non-digit noise glued to index lines by the capture step
static NON_DIGIT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\d]").unwrap()
});

// @struct: One timed caption
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    // @field: Position in the stream
    pub seq_num: usize,

    // @field: Start in milliseconds
    pub start_time_ms: u64,

    // @field: End in milliseconds
    pub end_time_ms: u64,

    // @field: Cue text
    pub text: String,
}

impl SubtitleEntry {
    /// Build an entry without validation, for callers that own the invariants
    #[allow(dead_code)]
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            text,
        }
    }

    // @creates: Entry that passed the range and text checks
    // @checks: End strictly after start, text not blank
    pub fn new_validated(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Result<Self> {
        if end_time_ms <= start_time_ms {
            return Err(anyhow!(
                "entry {}: end time {}ms is not after start time {}ms",
                seq_num, end_time_ms, start_time_ms
            ));
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(anyhow!("entry {}: no text", seq_num));
        }

        Ok(SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            text: text.to_string(),
        })
    }

    /// Parse an SRT timestamp (HH:MM:SS,mmm) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64> {
        let parts: Vec<&str> = timestamp.split([':', ',', '.']).collect();
        let [hours, minutes, seconds, millis] = parts[..] else {
            return Err(anyhow!("Expected HH:MM:SS,mmm, got {:?}", timestamp));
        };

        let hours: u64 = hours.trim().parse().context("bad hour field")?;
        let minutes: u64 = minutes.parse().context("bad minute field")?;
        let seconds: u64 = seconds.parse().context("bad second field")?;
        let millis: u64 = millis.parse().context("bad millisecond field")?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(anyhow!("Out-of-range time components in {:?}", timestamp));
        }

        Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }

    /// Parse a timestamp that may omit the millisecond part.
    ///
    /// Mention metadata carries bare HH:MM:SS stamps; an absent millisecond
    /// field reads as ,000.
    pub fn parse_timestamp_flexible(timestamp: &str) -> Result<u64> {
        let trimmed = timestamp.trim();
        if trimmed.contains(',') || trimmed.contains('.') {
            Self::parse_timestamp(trimmed)
        } else {
            Self::parse_timestamp(&format!("{},000", trimmed))
        }
    }

    /// Start time in SRT timestamp form
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time_ms)
    }

    /// End time in SRT timestamp form
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time_ms)
    }

    /// Format a timestamp in milliseconds to SRT form (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        format!("{},{:03}", Self::format_timestamp_short(ms), ms % 1_000)
    }

    /// Format a timestamp in milliseconds to the short clock form (HH:MM:SS)
    pub fn format_timestamp_short(ms: u64) -> String {
        let total_seconds = ms / 1_000;
        format!(
            "{:02}:{:02}:{:02}",
            total_seconds / 3_600,
            (total_seconds % 3_600) / 60,
            total_seconds % 60
        )
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{}\n{} --> {}\n{}",
            self.seq_num,
            self.format_start_time(),
            self.format_end_time(),
            self.text
        )?;
        writeln!(f)
    }
}

/// Parsed subtitle stream plus its source metadata
#[derive(Debug)]
pub struct SubtitleCollection {
    /// File the stream was read from
    pub source_file: PathBuf,

    /// Entries sorted by start time
    pub entries: Vec<SubtitleEntry>,

    /// Language code of the source text
    pub source_language: String,

    /// Malformed blocks dropped while parsing the source
    pub skipped_entries: usize,
}

impl SubtitleCollection {
    /// Empty collection for the given source
    pub fn new(source_file: PathBuf, source_language: String) -> Self {
        SubtitleCollection {
            source_file,
            entries: Vec::new(),
            source_language,
            skipped_entries: 0,
        }
    }

    /// Load a collection from an SRT file, sanitizing capture artifacts first
    pub fn from_srt_file<P: AsRef<Path>>(path: P, source_language: &str) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;

        Self::from_srt_string(&content, path.to_path_buf(), source_language)
    }

    /// Build a collection from SRT content
    pub fn from_srt_string(content: &str, source_file: PathBuf, source_language: &str) -> Result<Self> {
        let sanitized = Self::sanitize_captured_content(content);
        let (entries, skipped) = Self::parse_srt_entries(&sanitized)?;

        Ok(SubtitleCollection {
            source_file,
            entries,
            source_language: source_language.to_string(),
            skipped_entries: skipped,
        })
    }

    /// Build a collection from re-flowed segments, renumbered from 1
    pub fn from_segments(segments: &[Segment], source_file: PathBuf, source_language: &str) -> Self {
        let entries = segments
            .iter()
            .enumerate()
            .map(|(i, segment)| SubtitleEntry {
                seq_num: i + 1,
                start_time_ms: segment.start_ms,
                end_time_ms: segment.end_ms,
                text: segment.text.clone(),
            })
            .collect();

        SubtitleCollection {
            source_file,
            entries,
            source_language: source_language.to_string(),
            skipped_entries: 0,
        }
    }

    /// Strip the escaping the browser capture step leaves behind.
    ///
    /// Captured streams arrive as a quoted blob with literal \n sequences
    /// instead of newlines. Plain SRT content passes through unchanged.
    pub fn sanitize_captured_content(content: &str) -> String {
        let unescaped = content.replace("\\\\n", "\\n").replace("\\n", "\n");
        let trimmed = unescaped.trim();

        trimmed
            .trim_matches('"')
            .trim_matches('\'')
            .to_string()
    }

    /// Write the collection to an SRT file, creating missing parent directories
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        fs::write(path, self.to_srt_string())
            .with_context(|| format!("Failed to write subtitle file: {}", path.display()))
    }

    /// Render the collection as SRT text
    pub fn to_srt_string(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.to_string());
        }
        out
    }

    /// Total duration covered by the entries, in milliseconds
    pub fn total_duration_ms(&self) -> u64 {
        self.entries.last().map(|e| e.end_time_ms).unwrap_or(0)
    }

    /// Parse SRT text into entries, discarding the skip count
    pub fn parse_srt_string(content: &str) -> Result<Vec<SubtitleEntry>> {
        Self::parse_srt_entries(content).map(|(entries, _)| entries)
    }

    /// Parse SRT content, returning the entries and the number of dropped blocks.
    ///
    /// Blocks are separated by blank lines; each block holds an index line, a
    /// timestamp line and one or more text lines. A block that fails any of
    /// those stages is dropped and counted, never fatal.
    fn parse_srt_entries(content: &str) -> Result<(Vec<SubtitleEntry>, usize)> {
        // Whitespace-only content is an empty stream, not a parse failure
        if content.trim().is_empty() {
            return Ok((Vec::new(), 0));
        }

        let mut entries = Vec::new();
        let mut skipped = 0usize;

        let mut block: Vec<(usize, &str)> = Vec::new();
        for (number, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                Self::take_block(&mut block, &mut entries, &mut skipped);
            } else {
                block.push((number + 1, line));
            }
        }
        Self::take_block(&mut block, &mut entries, &mut skipped);

        if entries.is_empty() {
            warn!("No usable subtitle entries in the input");
            return Err(SubtitleError::NoValidEntries.into());
        }

        if skipped > 0 {
            warn!("Dropped {} malformed subtitle blocks while parsing", skipped);
        }

        // Captured blocks occasionally arrive out of order
        entries.sort_by_key(|entry| entry.start_time_ms);

        let overlapping = entries
            .windows(2)
            .filter(|pair| pair[0].end_time_ms > pair[1].start_time_ms)
            .count();
        if overlapping > 0 {
            warn!("{} entries overlap their successor", overlapping);
        }

        // Renumber so the output blocks count from 1
        for (position, entry) in entries.iter_mut().enumerate() {
            entry.seq_num = position + 1;
        }

        Ok((entries, skipped))
    }

    /// Close out the block gathered so far, keeping or counting it
    fn take_block(
        block: &mut Vec<(usize, &str)>,
        entries: &mut Vec<SubtitleEntry>,
        skipped: &mut usize,
    ) {
        if block.is_empty() {
            return;
        }

        let lines = std::mem::take(block);
        match Self::parse_block(&lines) {
            Ok(entry) => entries.push(entry),
            Err(reason) => {
                warn!(
                    "Skipping malformed subtitle block at line {}: {}",
                    lines[0].0, reason
                );
                *skipped += 1;
            }
        }
    }

    /// Parse one index / timestamp / text block into an entry
    fn parse_block(lines: &[(usize, &str)]) -> Result<SubtitleEntry> {
        let (&(_, index_line), rest) = lines
            .split_first()
            .ok_or_else(|| anyhow!("empty block"))?;
        let seq_num = Self::parse_index_line(index_line)
            .ok_or_else(|| anyhow!("no sequence number in {:?}", index_line))?;

        let &(_, time_line) = rest
            .first()
            .ok_or_else(|| anyhow!("block ends before the timestamp line"))?;
        let (start_ms, end_ms) = Self::parse_timestamp_line(time_line)
            .or_else(|| {
                // Retry with capture noise stripped from the timestamp line
                Self::parse_timestamp_line(&TIMESTAMP_NOISE_REGEX.replace_all(time_line, ""))
            })
            .ok_or_else(|| anyhow!("unparseable timestamp line {:?}", time_line))?;

        // Multi-line cues read as one space-joined text
        let text = rest[1..]
            .iter()
            .map(|(_, line)| *line)
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            return Err(anyhow!("no text lines"));
        }

        SubtitleEntry::new_validated(seq_num, start_ms, end_ms, text)
    }

    /// Read a block index, tolerating stray characters glued on by the
    /// capture step
    fn parse_index_line(line: &str) -> Option<usize> {
        if let Ok(number) = line.parse::<usize>() {
            return Some(number);
        }

        let digits = NON_DIGIT_REGEX.replace_all(line, "");
        if digits.is_empty() {
            return None;
        }
        debug!("Repaired noisy index line {:?}", line);
        digits.parse::<usize>().ok()
    }

    /// Parse a full `start --> end` line into millisecond times
    fn parse_timestamp_line(line: &str) -> Option<(u64, u64)> {
        let caps = TIMESTAMP_REGEX.captures(line)?;
        let field = |index: usize| caps[index].parse::<u64>().unwrap_or(0);

        let start = (field(1) * 3600 + field(2) * 60 + field(3)) * 1000 + field(4);
        let end = (field(5) * 3600 + field(6) * 60 + field(7)) * 1000 + field(8);
        Some((start, end))
    }
}
