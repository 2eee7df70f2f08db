/*!
 * # subguide - Tutorial Captions to Learning Guides
 *
 * A Rust library for turning tutorial-video captions into localized,
 * timestamp-synchronized learning guides.
 *
 * ## What it does
 *
 * - Re-flows fragmented caption cues into guide-sized segments
 * - Translates subtitles with a tiered terminology dictionary
 * - Aligns node documentation mentions to the segment being narrated
 * - Generates chapter guide markdown with series navigation context
 * - Renders guides to styled standalone HTML pages
 * - Accumulates a cross-chapter series glossary
 * - Validates ISO 639-1 / 639-2 language codes
 *
 * ## Module map
 *
 * - `reflow` and `alignment` hold the timing core: cue merging and
 *   event-to-segment placement
 * - `subtitle_processor` reads and writes SRT, including the noisy blobs
 *   the browser capture step leaves behind
 * - `translation::dictionary` and `translation::glossary` cover the tiered
 *   lookup translation and the cross-chapter terminology store
 * - `nodes` resolves node mentions to documentation links and insertion
 *   records
 * - `guide` and `html` produce the markdown guide and its styled HTML form
 * - `app_config`, `app_controller`, `file_utils`, `language_utils` and
 *   `errors` carry the application shell around the core
 *
 * Licensed under MIT.
 */

// Lint exceptions shared by the whole library
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod alignment;
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod guide;
pub mod html;
pub mod language_utils;
pub mod nodes;
pub mod reflow;
pub mod subtitle_processor;
pub mod translation;

// Flat re-exports of the types most callers start from
pub use alignment::{Aligner, Event};
pub use app_config::Config;
pub use guide::{GuideGenerator, SeriesContext};
pub use html::HtmlRenderer;
pub use language_utils::{language_codes_match, normalize_to_part2t, get_language_name};
pub use nodes::{NodeCatalog, NodeInsertion};
pub use reflow::{reflow, Segment};
pub use subtitle_processor::{SubtitleCollection, SubtitleEntry};
pub use translation::{Dictionary, SeriesGlossary};
pub use errors::{AlignmentError, AppError, ReflowError, SubtitleError};
