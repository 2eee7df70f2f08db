/*!
 * Dictionary-driven localization for tutorial captions.
 *
 * This module contains the offline translation machinery used to localize
 * re-flowed caption segments. It is split into two submodules:
 *
 * - `dictionary`: Tiered lookup dictionary and per-tier statistics
 * - `glossary`: Series-wide terminology glossary with merge reporting
 */

// Callers import these from the module root
pub use self::dictionary::{Dictionary, MatchTier, PhraseRule, TranslationStats};
pub use self::glossary::{ChapterAdditions, MergeReport, SeriesGlossary, SeriesInfo, TermConflict};

pub mod dictionary;
pub mod glossary;
