/*!
 * Learning guide assembly.
 *
 * Builds the timestamp-synchronized Markdown study guide for one chapter:
 * a series header, one section per caption segment with the localized text
 * quoted, and node annotations attached to the section each insertion
 * belongs to. Annotation placement goes through the aligner, so every
 * insertion lands in exactly one section or is reported as unassigned.
 */

use std::path::Path;

use log::{debug, info, warn};

use crate::alignment::Aligner;
use crate::nodes::{self, NodeInsertion};
use crate::reflow::Segment;
use crate::subtitle_processor::{SubtitleCollection, SubtitleEntry};
use crate::file_utils::FileManager;

/// Chapters per series when the caller does not say otherwise
pub const DEFAULT_TOTAL_CHAPTERS: u32 = 6;

/// Known chapter title localizations, keyed by the squashed slug
fn localized_chapter_title(slug: &str) -> Option<&'static str> {
    match slug {
        "introduction" => Some("導入"),
        "basiclogic" => Some("基本ロジック"),
        "bridgestructure" => Some("橋梁構造"),
        "details" => Some("詳細"),
        "finishingtouches" => Some("仕上げ"),
        "finaltouches" => Some("最終調整"),
        _ => None,
    }
}

/// Series and chapter identity for one guide
#[derive(Debug, Clone)]
pub struct SeriesContext {
    /// Human-readable series name
    pub series_name: String,

    /// Chapter number with leading zeros stripped, or "Unknown"
    pub chapter_number: String,

    /// Localized chapter title, or the raw slug when unmapped
    pub chapter_title: String,

    /// Chapters in the whole series
    pub total_chapters: u32,

    /// Link to the chapter video, when known
    pub video_url: Option<String>,
}

impl SeriesContext {
    /// Derive series and chapter identity from a transcript path.
    ///
    /// Expects the layout `tutorials/<Series_Name>/.../chapter_NN_<slug>/
    /// transcript_<video_id>_*.srt`; any part that is missing falls back to
    /// a placeholder. A video URL passed in wins over one derived from the
    /// file name.
    pub fn from_subtitle_path<P: AsRef<Path>>(
        subtitle_path: P,
        total_chapters: u32,
        video_url: Option<String>,
    ) -> Self {
        let subtitle_path = subtitle_path.as_ref();

        let mut series_name = "Project Skylark Bridges".to_string();
        let mut chapter_number = "Unknown".to_string();
        let mut chapter_title = "Unknown".to_string();

        let parts: Vec<String> = subtitle_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();

        for (i, part) in parts.iter().enumerate() {
            if part == "tutorials" && i + 1 < parts.len() {
                series_name = parts[i + 1].replace('_', " ");
            } else if part.starts_with("chapter_") {
                // chapter_02_basic_logic carries the number and title slug
                let chapter_parts: Vec<&str> = part.splitn(3, '_').collect();
                if chapter_parts.len() >= 3 {
                    let stripped = chapter_parts[1].trim_start_matches('0');
                    chapter_number = if stripped.is_empty() { "0" } else { stripped }.to_string();

                    let slug = chapter_parts[2].replace('_', "");
                    chapter_title = localized_chapter_title(&slug)
                        .map(|title| title.to_string())
                        .unwrap_or(slug);
                }
            }
        }

        let video_url = video_url.or_else(|| {
            FileManager::transcript_video_id(subtitle_path).map(|video_id| {
                let url = format!("https://vimeo.com/{}", video_id);
                info!("Derived video URL from transcript name: {}", url);
                url
            })
        });

        SeriesContext {
            series_name,
            chapter_number,
            chapter_title,
            total_chapters,
            video_url,
        }
    }

    /// Guide heading line for this chapter
    pub fn heading(&self) -> String {
        format!(
            "# {} - Chapter {}: {} 学習ガイド（日本語版）",
            self.series_name, self.chapter_number, self.chapter_title
        )
    }
}

/// Builds chapter guides from localized captions and node insertions
pub struct GuideGenerator {
    context: SeriesContext,
    aligner: Aligner,
}

impl GuideGenerator {
    pub fn new(context: SeriesContext, aligner: Aligner) -> Self {
        GuideGenerator { context, aligner }
    }

    /// Assemble the guide Markdown for one chapter.
    ///
    /// An empty caption collection yields a guide with the header block and
    /// no sections. Insertions whose timestamps cannot be parsed, and events
    /// that precede the first caption, are dropped with a warning.
    pub fn generate(&self, collection: &SubtitleCollection, insertions: &[NodeInsertion]) -> String {
        let segments: Vec<Segment> = collection.entries.iter().map(Segment::from).collect();

        let (events, skipped) = nodes::insertions_to_events(insertions);
        if skipped > 0 {
            warn!("Dropped {} malformed node insertions from the guide", skipped);
        }

        let assignments = self.aligner.align(&events, &segments);
        let unassigned = assignments.iter().filter(|a| a.is_none()).count();
        if unassigned > 0 {
            warn!("{} node annotation(s) left unassigned", unassigned);
            for (event, assignment) in events.iter().zip(&assignments) {
                if assignment.is_none() {
                    debug!("Unassigned annotation: {}", event);
                }
            }
        }
        let grouped = Aligner::group_by_segment(&assignments, segments.len());

        let mut lines: Vec<String> = Vec::new();

        lines.push(self.context.heading());
        lines.push(String::new());
        lines.push("**シリーズ情報**:".to_string());
        lines.push(String::new());
        lines.push(format!("- シリーズ: {}", self.context.series_name));
        lines.push(format!(
            "- チャプター: {} / {}",
            self.context.chapter_number, self.context.total_chapters
        ));
        match &self.context.video_url {
            Some(url) => lines.push(format!("- 動画URL: [{}]({})", self.context.series_name, url)),
            None => lines.push(format!("- 動画URL: {}", self.context.series_name)),
        }
        lines.push(format!("- 時間: {}", Self::video_duration(collection)));
        lines.push(String::new());
        lines.push("---".to_string());
        lines.push(String::new());

        for (idx, segment) in segments.iter().enumerate() {
            lines.push(format!(
                "## {}",
                SubtitleEntry::format_timestamp_short(segment.start_ms)
            ));
            lines.push(String::new());
            lines.push(format!("「{}」", segment.text));
            lines.push(String::new());

            for &event_idx in &grouped[idx] {
                let event = &events[event_idx];
                let doc_link = event
                    .payload
                    .get("doc_link_ja")
                    .and_then(|v| v.as_str())
                    .unwrap_or("#");

                let node_type = nodes::extract_node_type(doc_link);
                let full_name = if node_type.is_empty() {
                    event.label.clone()
                } else {
                    format!("{} {}", event.label, node_type)
                };

                lines.push(format!("📝 **[{}]({})**", full_name, doc_link));
                lines.push(String::new());
            }

            lines.push("---".to_string());
            lines.push(String::new());
        }

        lines.join("\n")
    }

    /// Chapter running time, read off the last caption
    fn video_duration(collection: &SubtitleCollection) -> String {
        match collection.entries.last() {
            Some(entry) => SubtitleEntry::format_timestamp_short(entry.end_time_ms),
            None => "Unknown".to_string(),
        }
    }
}
