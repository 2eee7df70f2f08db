use anyhow::{Result, Context};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use std::fs::OpenOptions;
use std::io::Write;
use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;

// @module: Filesystem helpers for pipeline artifacts

// Sequence number followed by an SRT timestamp line
static SRT_SNIFF_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+\s*\r?\n\d{2}:\d{2}:\d{2},\d{3}\s+-->\s+\d{2}:\d{2}:\d{2},\d{3}").unwrap()
});

// Transcript files carry the video id in the name
static TRANSCRIPT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"transcript_(\d+)(?:_.*)?\.srt$").unwrap()
});

// @struct: File system operations
pub struct FileManager;

impl FileManager {
    // @checks: Regular file existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory presence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Missing directory chain
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        fs::create_dir_all(path.as_ref())
            .with_context(|| format!("Failed to create directory: {:?}", path.as_ref()))
    }

    // @generates: Path in output_dir built from the input stem plus a suffix
    // @params: input_file, output_dir, suffix, extension
    pub fn suffixed_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        suffix: &str,
        extension: &str,
    ) -> PathBuf {
        let stem = input_file.as_ref().file_stem().unwrap_or_default();
        let file_name = format!("{}{}.{}", stem.to_string_lossy(), suffix, extension);
        output_dir.as_ref().join(file_name)
    }

    // @generates: Sibling path with the same stem and a new extension
    pub fn sibling_with_extension<P: AsRef<Path>>(input_file: P, extension: &str) -> PathBuf {
        input_file.as_ref().with_extension(extension)
    }

    /// Recursively collect files carrying the given extension. The leading
    /// dot is optional and the comparison ignores case.
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let wanted = extension.trim_start_matches('.');
        let mut found = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry =
                entry.with_context(|| format!("Failed to walk directory: {:?}", dir.as_ref()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let matches = entry
                .path()
                .extension()
                .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(wanted))
                .unwrap_or(false);
            if matches {
                found.push(entry.into_path());
            }
        }

        Ok(found)
    }

    /// Find tutorial transcript files (transcript_<video_id>*.srt) in a
    /// directory, sorted by path for stable processing order
    pub fn find_transcripts<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut transcripts: Vec<PathBuf> = Self::find_files(dir, "srt")?
            .into_iter()
            .filter(|path| {
                path.file_name()
                    .map(|name| TRANSCRIPT_REGEX.is_match(&name.to_string_lossy()))
                    .unwrap_or(false)
            })
            .collect();

        transcripts.sort();
        Ok(transcripts)
    }

    /// Extract the video id from a transcript file name, if present
    pub fn transcript_video_id<P: AsRef<Path>>(path: P) -> Option<String> {
        let name = path.as_ref().file_name()?.to_string_lossy().to_string();
        TRANSCRIPT_REGEX
            .captures(&name)
            .map(|caps| caps[1].to_string())
    }

    /// Read a whole file into a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path.as_ref()))
    }

    /// Write a string to a file, creating parent directories on demand
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            Self::ensure_dir(parent)?;
        }
        fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))
    }

    /// Copy a file, creating the target directory when missing
    pub fn copy_file<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) -> Result<()> {
        let from = from.as_ref();
        let to = to.as_ref();

        if !Self::file_exists(from) {
            return Err(anyhow::anyhow!("Copy source does not exist: {:?}", from));
        }
        if let Some(parent) = to.parent() {
            Self::ensure_dir(parent)?;
        }
        fs::copy(from, to).with_context(|| format!("Failed to copy {:?} to {:?}", from, to))?;

        Ok(())
    }

    /// Append a timestamped line to a processing log, creating the file on
    /// first use
    pub fn append_to_log_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            Self::ensure_dir(parent)?;
        }

        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file: {:?}", path))?;

        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(log, "[{}] {}", stamp, content)
            .with_context(|| format!("Failed to append to log file: {:?}", path))?;

        Ok(())
    }

    /// Detect what kind of pipeline input a file is, by extension first and
    /// by content sniffing when the extension is missing or unknown
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> Result<FileType> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow::anyhow!("Input file does not exist: {:?}", path));
        }

        if let Some(ext) = path.extension() {
            match ext.to_string_lossy().to_lowercase().as_str() {
                "srt" => return Ok(FileType::Subtitle),
                "json" => return Ok(FileType::Metadata),
                "md" | "markdown" => return Ok(FileType::Guide),
                "html" | "htm" => return Ok(FileType::Html),
                _ => {}
            }
        }

        // Extensionless caption dumps from the stream extractor still look
        // like SRT inside; mention metadata opens with a JSON container
        if let Ok(content) = fs::read_to_string(path) {
            if content.contains("-->") && SRT_SNIFF_REGEX.is_match(&content) {
                return Ok(FileType::Subtitle);
            }
            let trimmed = content.trim_start();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                return Ok(FileType::Metadata);
            }
        }

        Ok(FileType::Unknown)
    }
}

/// What kind of pipeline input a path holds
#[derive(Debug, PartialEq, Eq)]
pub enum FileType {
    /// SRT caption stream
    Subtitle,
    /// Mention metadata or catalog file (JSON)
    Metadata,
    /// Learning guide (Markdown)
    Guide,
    /// Rendered guide page (HTML)
    Html,
    /// Nothing the pipeline recognizes
    Unknown,
}
