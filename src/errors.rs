/*!
 * Typed error surface for subguide.
 *
 * One thiserror enum per area, plus an umbrella type that the application
 * layers convert into at their boundaries.
 */

// Variants exist for library consumers even when the binary never builds them
#![allow(dead_code)]

use thiserror::Error;

/// Subtitle parsing failures that are fatal rather than skippable
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// Content produced no usable entries at all
    #[error("No valid subtitle entries were found in the SRT content")]
    NoValidEntries,
}

/// Parameter violations rejected before a re-flow pass starts
#[derive(Error, Debug)]
pub enum ReflowError {
    /// Target duration must be a positive number of seconds
    #[error("Invalid target duration: {0} (must be > 0 seconds)")]
    InvalidTargetDuration(f64),

    /// Completion threshold must lie in [0, 1]
    #[error("Invalid completion threshold: {0} (must be within 0.0..=1.0)")]
    InvalidCompletionThreshold(f64),
}

/// Parameter violations rejected when building an aligner
#[derive(Error, Debug)]
pub enum AlignmentError {
    /// Boundary tolerance must be a non-negative number of seconds
    #[error("Invalid boundary tolerance: {0} (must be >= 0 seconds)")]
    InvalidTolerance(f64),
}

/// Umbrella error the application surface reports
#[derive(Error, Debug)]
pub enum AppError {
    /// A file operation failed
    #[error("File error: {0}")]
    File(String),

    /// Subtitle parsing failed
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// A re-flow parameter was rejected
    #[error("Re-flow error: {0}")]
    Reflow(#[from] ReflowError),

    /// An alignment parameter was rejected
    #[error("Alignment error: {0}")]
    Alignment(#[from] AlignmentError),

    /// Anything without a dedicated variant
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
