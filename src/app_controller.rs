use anyhow::{Result, Context, anyhow};
use log::{error, warn, info, debug};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle, MultiProgress};
use parking_lot::Mutex;

use crate::alignment::Aligner;
use crate::app_config::Config;
use crate::file_utils::{FileManager, FileType};
use crate::guide::{GuideGenerator, SeriesContext};
use crate::html::HtmlRenderer;
use crate::language_utils;
use crate::nodes::{self, MentionMetadata, NodeInsertion, NodeCatalog};
use crate::reflow::{reflow, ReflowStats};
use crate::subtitle_processor::{SubtitleCollection, SubtitleEntry};
use crate::translation::{Dictionary, SeriesGlossary, TranslationStats};

// @module: Application controller for the caption-to-guide pipeline

/// Output files written for one processed chapter
#[derive(Debug, Clone)]
pub struct ChapterArtifacts {
    /// Re-flowed source-language SRT
    pub fixed_srt: PathBuf,
    /// Translated SRT
    pub translated_srt: PathBuf,
    /// Node insertion data, when mention metadata was available
    pub insertions_json: Option<PathBuf>,
    /// Learning guide markdown
    pub guide_markdown: PathBuf,
    /// Styled HTML guide
    pub guide_html: PathBuf,
}

/// Result of processing one chapter transcript
#[derive(Clone)]
pub struct ChapterOutcome {
    /// Paths written for this chapter
    pub artifacts: ChapterArtifacts,
    /// Re-flow statistics
    pub reflow_stats: ReflowStats,
    /// Translation coverage statistics
    pub translation_stats: TranslationStats,
    /// Series context derived from the transcript path
    pub context: SeriesContext,
    /// Established terms that occurred in this chapter's source text
    pub chapter_terms: BTreeMap<String, String>,
}

/// One chapter's contribution to the series glossary
struct GlossaryUpdate {
    chapter_number: u32,
    chapter_slug: String,
    series_name: String,
    terms: BTreeMap<String, String>,
    focus_areas: Vec<String>,
}

/// Main application controller for the caption-to-guide pipeline
pub struct Controller {
    // @field: Effective settings for every operation
    config: Config,
    // @field: Tiered translation dictionary, glossary terms merged in
    dictionary: Dictionary,
    // @field: Node documentation catalog
    catalog: NodeCatalog,
}

impl Controller {
    /// Controller on default settings, as the test suite builds it
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Build a controller around caller-supplied settings
    pub fn with_config(config: Config) -> Result<Self> {
        let mut dictionary = match &config.translation.dictionary_path {
            Some(path) => Dictionary::from_json_file(path)
                .context(format!("Failed to load dictionary from {:?}", path))?,
            None => Dictionary::builtin(),
        };

        // Established glossary terms override dictionary entries
        if let Some(glossary_path) = &config.translation.glossary_path {
            if FileManager::file_exists(glossary_path) {
                let glossary = SeriesGlossary::from_file(glossary_path)?;
                dictionary.extend_terms(&glossary.consistent_translations);
                debug!(
                    "Merged {} glossary terms into the dictionary",
                    glossary.term_count()
                );
            }
        }

        let catalog = match &config.guide.node_catalog_path {
            Some(path) => NodeCatalog::from_json_file(path)
                .context(format!("Failed to load node catalog from {:?}", path))?,
            None => NodeCatalog::builtin(),
        };

        debug!(
            "Controller ready: {} dictionary entries, {} catalog nodes",
            dictionary.len(),
            catalog.len()
        );

        Ok(Self {
            config,
            dictionary,
            catalog,
        })
    }

    /// Whether construction left the controller ready to run
    pub fn is_initialized(&self) -> bool {
        !self.config.source_language.is_empty() && !self.config.target_language.is_empty()
    }

    /// Re-flow an SRT file into longer segments and write the result
    pub fn fix_file(&self, input_file: &Path, output_file: Option<&Path>) -> Result<(PathBuf, ReflowStats)> {
        let collection = SubtitleCollection::from_srt_file(input_file, &self.config.source_language)?;
        let (fixed, stats) = self.reflow_collection(&collection)?;

        let output_path = match output_file {
            Some(path) => path.to_path_buf(),
            None => FileManager::suffixed_output_path(
                input_file,
                input_file.parent().unwrap_or(Path::new(".")),
                "_fixed",
                "srt",
            ),
        };
        fixed.write_to_srt(&output_path)?;

        info!("{}", stats.summary());
        info!("Success: {}", output_path.display());

        Ok((output_path, stats))
    }

    /// Translate an SRT file with the tiered dictionary and write the result
    pub fn translate_file(&self, input_file: &Path, output_file: Option<&Path>) -> Result<(PathBuf, TranslationStats)> {
        let collection = SubtitleCollection::from_srt_file(input_file, &self.config.source_language)?;
        let (translated, stats, _chapter_terms) = self.translate_collection(&collection);

        let output_path = match output_file {
            Some(path) => path.to_path_buf(),
            None => FileManager::suffixed_output_path(
                input_file,
                input_file.parent().unwrap_or(Path::new(".")),
                &self.target_language_suffix(),
                "srt",
            ),
        };
        translated.write_to_srt(&output_path)?;

        info!("{}", stats.summary());
        info!("Success: {}", output_path.display());

        Ok((output_path, stats))
    }

    /// Generate node insertion data from a mention metadata file
    pub fn generate_insertions_file(&self, mentions_file: &Path, output_file: &Path) -> Result<Vec<NodeInsertion>> {
        let metadata = MentionMetadata::from_file(mentions_file)?;
        let (insertions, skipped) =
            nodes::generate_insertions(&metadata, &self.catalog, self.config.guide.insert_offset);

        if skipped > 0 {
            warn!("Skipped {} malformed mention timestamps", skipped);
        }

        nodes::save_insertions(output_file, &insertions)?;
        info!(
            "Generated {} node insertions for {} mentioned nodes: {}",
            insertions.len(),
            metadata.houdini_nodes.len(),
            output_file.display()
        );

        Ok(insertions)
    }

    /// Generate learning-guide markdown from a translated SRT and optional
    /// node insertion data
    pub fn generate_guide(
        &self,
        subtitle_file: &Path,
        node_data: Option<&Path>,
        output_file: &Path,
        video_url: Option<String>,
    ) -> Result<PathBuf> {
        let collection = SubtitleCollection::from_srt_file(subtitle_file, &self.config.target_language)?;

        let insertions = match node_data {
            Some(path) => nodes::load_insertions(path)
                .context(format!("Failed to load node insertion data from {:?}", path))?,
            None => Vec::new(),
        };

        let context = SeriesContext::from_subtitle_path(
            subtitle_file,
            self.config.guide.total_chapters,
            video_url.or_else(|| self.config.guide.video_url.clone()),
        );
        let aligner = Aligner::with_tolerance(self.config.alignment.boundary_tolerance)?;

        let markdown = GuideGenerator::new(context, aligner).generate(&collection, &insertions);
        FileManager::write_to_file(output_file, &markdown)?;

        info!("Success: {}", output_file.display());
        Ok(output_file.to_path_buf())
    }

    /// Convert guide markdown to a styled HTML page
    pub fn render_guide(&self, input_file: &Path, output_file: Option<&Path>) -> Result<PathBuf> {
        let markdown = FileManager::read_to_string(input_file)?;
        let html = HtmlRenderer::new().render(&markdown);

        let output_path = match output_file {
            Some(path) => path.to_path_buf(),
            None => FileManager::sibling_with_extension(input_file, "html"),
        };
        FileManager::write_to_file(&output_path, &html)?;

        info!("Success: {}", output_path.display());
        Ok(output_path)
    }

    /// Migrate legacy documentation URLs inside insertion files in place
    pub fn fix_insertion_links(&self, files: &[PathBuf]) -> Result<usize> {
        let mut total = 0usize;

        for file in files {
            let changed = nodes::repair_insertion_file(file)
                .context(format!("Failed to repair insertion file {:?}", file))?;
            if changed > 0 {
                info!("{}: migrated {} links", file.display(), changed);
            } else {
                debug!("{}: no legacy links", file.display());
            }
            total += changed;
        }

        Ok(total)
    }

    /// Process a single transcript end to end and record it in the glossary
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<()> {
        match self.process_chapter(&input_file, &output_dir, force_overwrite)? {
            Some(outcome) => {
                let fallback_series = outcome.context.series_name.clone();
                self.apply_glossary_updates(
                    Self::glossary_updates_from(&[outcome]),
                    &fallback_series,
                )?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Process every transcript under a series directory, bounded-parallel,
    /// then update the series glossary once
    pub async fn run_series(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<()> {
        // Wall-clock for the summary line at the end
        let start_time = Instant::now();

        if !input_dir.exists() {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        // Outputs of earlier runs sit beside the originals and match the
        // transcript pattern themselves; only the originals are inputs
        let transcripts: Vec<PathBuf> = FileManager::find_transcripts(&input_dir)?
            .into_iter()
            .filter(|path| !self.is_run_artifact(path))
            .collect();
        if transcripts.is_empty() {
            return Err(anyhow!(
                "No transcript files found in directory: {:?}",
                input_dir
            ));
        }

        info!("Found {} transcript(s) under {:?}", transcripts.len(), input_dir);

        // Create a progress bar for series processing
        let multi_progress = MultiProgress::new();
        let series_pb = multi_progress.add(ProgressBar::new(transcripts.len() as u64));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chapters ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        series_pb.set_style(template_result.progress_chars("█▓▒░"));
        series_pb.set_message("Processing chapters");

        let translation_totals = Arc::new(Mutex::new(TranslationStats::new()));
        let input_dir_ref = &input_dir;
        let series_pb_ref = &series_pb;

        // Process chapters concurrently, bounded by the configured parallelism
        let mut results = stream::iter(transcripts.iter().enumerate())
            .map(|(index, transcript)| {
                let translation_totals = Arc::clone(&translation_totals);
                async move {
                    let file_name = transcript
                        .file_name()
                        .map(|f| f.to_string_lossy().to_string())
                        .unwrap_or_else(|| "unknown".to_string());
                    series_pb_ref.set_message(format!("Processing: {}", file_name));

                    let output_dir = transcript
                        .parent()
                        .map(|parent| parent.to_path_buf())
                        .unwrap_or_else(|| input_dir_ref.clone());

                    let result = self.process_chapter(transcript, &output_dir, force_overwrite);

                    if let Ok(Some(outcome)) = &result {
                        translation_totals.lock().merge(&outcome.translation_stats);
                    }

                    series_pb_ref.inc(1);
                    (index, file_name, result)
                }
            })
            .buffer_unordered(self.config.batch.concurrent_files)
            .collect::<Vec<_>>()
            .await;

        series_pb.finish_with_message("Series processing complete");

        // Restore source order for reporting and glossary updates
        results.sort_by_key(|(index, _, _)| *index);

        let mut outcomes = Vec::new();
        let mut success_count = 0;
        let mut skip_count = 0;
        let mut error_count = 0;

        for (_, file_name, result) in results {
            match result {
                Ok(Some(outcome)) => {
                    outcomes.push(outcome);
                    success_count += 1;
                }
                Ok(None) => {
                    skip_count += 1;
                }
                Err(e) => {
                    error!("Error processing file {}: {}", file_name, e);
                    error_count += 1;
                }
            }
        }

        // Aggregate translation coverage across the whole series
        if success_count > 0 {
            info!("{}", translation_totals.lock().summary());
        }

        // Record each completed chapter into the series glossary
        let fallback_series = input_dir
            .file_name()
            .map(|name| name.to_string_lossy().replace('_', " "))
            .unwrap_or_else(|| "Unknown".to_string());
        self.apply_glossary_updates(Self::glossary_updates_from(&outcomes), &fallback_series)?;

        let duration = start_time.elapsed();
        let summary_message = format!(
            "Series processing completed: {} processed, {} skipped, {} errors",
            success_count, skip_count, error_count
        );
        info!("{}", summary_message);

        // Append the run summary to the processing log
        let log_path = self
            .config
            .batch
            .processing_log
            .clone()
            .unwrap_or_else(|| input_dir.join("subguide.log"));
        let log_line = format!(
            "{} - Duration: {}",
            summary_message,
            Self::format_duration(duration)
        );
        if let Err(e) = FileManager::append_to_log_file(&log_path, &log_line) {
            warn!("Failed to write processing log: {}", e);
        } else {
            info!("Processing log updated: {}", log_path.display());
        }

        Ok(())
    }

    /// Process one transcript end to end: re-flow, translate, node
    /// insertions, guide markdown, styled HTML.
    ///
    /// Returns `None` when the translated output already exists and
    /// overwriting was not requested.
    pub fn process_chapter(
        &self,
        input_file: &Path,
        output_dir: &Path,
        force_overwrite: bool,
    ) -> Result<Option<ChapterOutcome>> {
        let start_time = Instant::now();

        if !input_file.exists() {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }
        FileManager::ensure_dir(output_dir)?;

        let file_type = FileManager::detect_file_type(input_file)?;
        if file_type != FileType::Subtitle {
            return Err(anyhow!("Not a subtitle file: {:?}", input_file));
        }

        let translated_path = FileManager::suffixed_output_path(
            input_file,
            output_dir,
            &self.target_language_suffix(),
            "srt",
        );
        if translated_path.exists() && !force_overwrite {
            warn!(
                "Skipping {:?}, translation already exists (use -f to force overwrite)",
                input_file
            );
            return Ok(None);
        }

        // Re-flow the captions into guide-sized segments
        let collection = SubtitleCollection::from_srt_file(input_file, &self.config.source_language)?;
        let (fixed, reflow_stats) = self.reflow_collection(&collection)?;
        let fixed_path = FileManager::suffixed_output_path(input_file, output_dir, "_fixed", "srt");
        fixed.write_to_srt(&fixed_path)?;

        // Translate the re-flowed segments
        let (translated, translation_stats, chapter_terms) = self.translate_collection(&fixed);
        translated.write_to_srt(&translated_path)?;

        // Node insertions: generate from mention metadata when present,
        // otherwise reuse (and repair) an existing insertion file
        let insertions_path = FileManager::suffixed_output_path(
            input_file,
            output_dir,
            "_node_insertions",
            "json",
        );
        let mentions_path = FileManager::suffixed_output_path(
            input_file,
            input_file.parent().unwrap_or(Path::new(".")),
            "_mentions",
            "json",
        );
        let (insertions, insertions_json) = if mentions_path.exists() {
            let insertions = self.generate_insertions_file(&mentions_path, &insertions_path)?;
            (insertions, Some(insertions_path))
        } else if insertions_path.exists() {
            let migrated = nodes::repair_insertion_file(&insertions_path)?;
            if migrated > 0 {
                info!(
                    "Migrated {} legacy links in {}",
                    migrated,
                    insertions_path.display()
                );
            }
            let insertions = nodes::load_insertions(&insertions_path)?;
            (insertions, Some(insertions_path))
        } else {
            debug!("No mention metadata for {:?}", input_file);
            (Vec::new(), None)
        };

        // Guide markdown with aligned node annotations
        let context = SeriesContext::from_subtitle_path(
            input_file,
            self.config.guide.total_chapters,
            self.config.guide.video_url.clone(),
        );
        let aligner = Aligner::with_tolerance(self.config.alignment.boundary_tolerance)?;
        let markdown = GuideGenerator::new(context.clone(), aligner).generate(&translated, &insertions);
        let guide_path = FileManager::suffixed_output_path(input_file, output_dir, "_guide", "md");
        FileManager::write_to_file(&guide_path, &markdown)?;

        // Styled HTML
        let html = HtmlRenderer::new().render(&markdown);
        let html_path = FileManager::sibling_with_extension(&guide_path, "html");
        FileManager::write_to_file(&html_path, &html)?;

        info!("{}", reflow_stats.summary());
        info!("{}", translation_stats.summary());
        info!(
            "Chapter complete in {}: {}",
            Self::format_duration(start_time.elapsed()),
            guide_path.display()
        );

        Ok(Some(ChapterOutcome {
            artifacts: ChapterArtifacts {
                fixed_srt: fixed_path,
                translated_srt: translated_path,
                insertions_json,
                guide_markdown: guide_path,
                guide_html: html_path,
            },
            reflow_stats,
            translation_stats,
            context,
            chapter_terms,
        }))
    }

    /// Re-flow a parsed collection, keeping timing stats
    fn reflow_collection(&self, collection: &SubtitleCollection) -> Result<(SubtitleCollection, ReflowStats)> {
        let start = Instant::now();
        let segments = reflow(
            &collection.entries,
            self.config.reflow.target_duration,
            self.config.reflow.completion_threshold,
        )?;
        let stats = ReflowStats::from_pass(&collection.entries, &segments, start.elapsed());

        let fixed = SubtitleCollection::from_segments(
            &segments,
            collection.source_file.clone(),
            &collection.source_language,
        );

        Ok((fixed, stats))
    }

    /// Translate every entry of a collection with the tiered dictionary.
    ///
    /// Also collects which established terms occurred in the source text so
    /// the chapter can be recorded into the series glossary afterwards.
    fn translate_collection(
        &self,
        collection: &SubtitleCollection,
    ) -> (SubtitleCollection, TranslationStats, BTreeMap<String, String>) {
        let mut stats = TranslationStats::new();
        let mut chapter_terms = BTreeMap::new();
        let mut translated = SubtitleCollection::new(
            collection.source_file.clone(),
            self.config.target_language.clone(),
        );

        for entry in &collection.entries {
            let (text, tier) = self.dictionary.translate(&entry.text);
            stats.record(tier);

            for (term, translation) in &self.dictionary.terms {
                if entry.text.contains(term.as_str()) {
                    chapter_terms.insert(term.clone(), translation.clone());
                }
            }

            translated.entries.push(SubtitleEntry::new(
                entry.seq_num,
                entry.start_time_ms,
                entry.end_time_ms,
                text,
            ));
        }

        stats.processing_duration = stats.start_time.elapsed();
        (translated, stats, chapter_terms)
    }

    /// Turn chapter outcomes into glossary updates, dropping chapters whose
    /// number could not be parsed from the path
    fn glossary_updates_from(outcomes: &[ChapterOutcome]) -> Vec<GlossaryUpdate> {
        let mut updates = Vec::new();

        for outcome in outcomes {
            match outcome.context.chapter_number.parse::<u32>() {
                Ok(chapter_number) => updates.push(GlossaryUpdate {
                    chapter_number,
                    chapter_slug: outcome.context.chapter_title.clone(),
                    series_name: outcome.context.series_name.clone(),
                    terms: outcome.chapter_terms.clone(),
                    focus_areas: vec![outcome.context.chapter_title.clone()],
                }),
                Err(_) => warn!(
                    "Chapter number {:?} is not numeric, skipping glossary update",
                    outcome.context.chapter_number
                ),
            }
        }

        updates
    }

    /// Record chapter contributions into the configured series glossary
    fn apply_glossary_updates(&self, updates: Vec<GlossaryUpdate>, fallback_series: &str) -> Result<()> {
        let Some(glossary_path) = &self.config.translation.glossary_path else {
            debug!("No glossary configured, skipping terminology tracking");
            return Ok(());
        };
        if updates.is_empty() {
            return Ok(());
        }

        let mut glossary = if FileManager::file_exists(glossary_path) {
            SeriesGlossary::from_file(glossary_path)?
        } else {
            let series_name = updates
                .first()
                .map(|update| update.series_name.clone())
                .unwrap_or_else(|| fallback_series.to_string());
            SeriesGlossary::new(&series_name)
        };

        for update in &updates {
            let report = glossary.record_chapter(
                update.chapter_number,
                &update.chapter_slug,
                &update.terms,
                update.focus_areas.clone(),
            );
            info!(
                "Glossary: chapter {} recorded ({} added, {} unchanged, {} conflicts)",
                update.chapter_number,
                report.added,
                report.unchanged,
                report.conflicts.len()
            );
        }

        glossary.save(glossary_path)?;
        info!(
            "Glossary saved with {} established terms: {}",
            glossary.term_count(),
            glossary_path.display()
        );

        Ok(())
    }

    /// Whether a transcript path names an output of this pipeline rather
    /// than an original capture
    fn is_run_artifact(&self, path: &Path) -> bool {
        match path.file_stem() {
            Some(stem) => {
                let stem = stem.to_string_lossy();
                stem.ends_with("_fixed") || stem.ends_with(&self.target_language_suffix())
            }
            None => false,
        }
    }

    /// Output suffix for the target language, e.g. "ja" -> "_japanese"
    fn target_language_suffix(&self) -> String {
        match language_utils::get_language_name(&self.config.target_language) {
            Ok(name) => format!("_{}", name.to_lowercase()),
            Err(_) => format!("_{}", self.config.target_language.to_lowercase()),
        }
    }

    // Format duration in a human-readable format
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
