use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};

/// Settings for every pipeline stage, stored as JSON on disk.
/// Each field and section is independently optional in the file, so
/// configs written by older versions keep loading as knobs are added.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// ISO 639 code the transcripts are in
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// ISO 639 code translations are written in
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Segment re-flow settings
    #[serde(default)]
    pub reflow: ReflowConfig,

    /// Timestamp alignment settings
    #[serde(default)]
    pub alignment: AlignmentConfig,

    /// Dictionary translation settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Guide generation settings
    #[serde(default)]
    pub guide: GuideConfig,

    /// Batch processing settings
    #[serde(default)]
    pub batch: BatchConfig,

    /// Logging verbosity for the whole process
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Configuration for subtitle segment re-flowing
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReflowConfig {
    /// Target segment duration in seconds
    #[serde(default = "default_target_duration")]
    pub target_duration: f64,

    /// Fraction of the target duration after which a completed sentence
    /// closes the segment early (0.0 to 1.0)
    #[serde(default = "default_completion_threshold")]
    pub completion_threshold: f64,
}

impl Default for ReflowConfig {
    fn default() -> Self {
        Self {
            target_duration: default_target_duration(),
            completion_threshold: default_completion_threshold(),
        }
    }
}

/// Configuration for event-to-segment alignment
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AlignmentConfig {
    /// Tolerance in seconds when matching an event against segment starts
    #[serde(default = "default_boundary_tolerance")]
    pub boundary_tolerance: f64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            boundary_tolerance: default_boundary_tolerance(),
        }
    }
}

/// Configuration for dictionary translation
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TranslationConfig {
    /// Path to a dictionary JSON file; the built-in dictionary is used
    /// when absent
    #[serde(default)]
    pub dictionary_path: Option<PathBuf>,

    /// Path to the series glossary JSON file; terminology tracking is
    /// skipped when absent
    #[serde(default)]
    pub glossary_path: Option<PathBuf>,
}

/// Configuration for learning guide generation
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GuideConfig {
    /// Total number of chapters in the series
    #[serde(default = "default_total_chapters")]
    pub total_chapters: u32,

    /// Explicit video URL; derived from the transcript filename when absent
    #[serde(default)]
    pub video_url: Option<String>,

    /// Seconds to shift a node mention forward when generating insertions
    #[serde(default = "default_insert_offset")]
    pub insert_offset: f64,

    /// Path to a node catalog JSON file; the built-in catalog is used
    /// when absent
    #[serde(default)]
    pub node_catalog_path: Option<PathBuf>,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            total_chapters: default_total_chapters(),
            video_url: None,
            insert_offset: default_insert_offset(),
            node_catalog_path: None,
        }
    }
}

/// Configuration for batch processing of a series directory
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchConfig {
    /// Maximum number of chapter files processed concurrently
    #[serde(default = "default_concurrent_files")]
    pub concurrent_files: usize,

    /// Optional log file that batch runs append their summaries to
    #[serde(default)]
    pub processing_log: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrent_files: default_concurrent_files(),
            processing_log: None,
        }
    }
}

/// Verbosity steps, lowercase in JSON
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "ja".to_string()
}

fn default_target_duration() -> f64 {
    40.0
}

fn default_completion_threshold() -> f64 {
    0.8
}

fn default_boundary_tolerance() -> f64 {
    crate::alignment::DEFAULT_BOUNDARY_TOLERANCE
}

fn default_total_chapters() -> u32 {
    crate::guide::DEFAULT_TOTAL_CHAPTERS
}

fn default_insert_offset() -> f64 {
    crate::nodes::DEFAULT_INSERT_OFFSET
}

fn default_concurrent_files() -> usize {
    4
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).context(format!(
            "Failed to open config file: {:?}",
            path.as_ref()
        ))?;

        serde_json::from_str(&content).context(format!(
            "Failed to parse config file: {:?}",
            path.as_ref()
        ))
    }

    /// Save the configuration to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(path.as_ref(), content).context(format!(
            "Failed to write config to file: {:?}",
            path.as_ref()
        ))
    }

    /// Reject settings the pipeline could not run with
    pub fn validate(&self) -> Result<()> {
        // Both language codes must name real languages
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;
        let _target_name = crate::language_utils::get_language_name(&self.target_language)?;

        // Core parameters share the same bounds as the call-level checks
        crate::reflow::validate_params(
            self.reflow.target_duration,
            self.reflow.completion_threshold,
        )?;
        crate::alignment::Aligner::with_tolerance(self.alignment.boundary_tolerance)?;

        if self.batch.concurrent_files == 0 {
            return Err(anyhow!("batch.concurrent_files must be at least 1"));
        }

        if self.guide.total_chapters == 0 {
            return Err(anyhow!("guide.total_chapters must be at least 1"));
        }

        if !self.guide.insert_offset.is_finite() {
            return Err(anyhow!(
                "guide.insert_offset must be finite, got {}",
                self.guide.insert_offset
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            reflow: ReflowConfig::default(),
            alignment: AlignmentConfig::default(),
            translation: TranslationConfig::default(),
            guide: GuideConfig::default(),
            batch: BatchConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
