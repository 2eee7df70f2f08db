/*!
 * Series-wide terminology glossary.
 *
 * One JSON file per tutorial series records the established translations,
 * per-chapter additions, and per-node usage contexts. Chapters merge their
 * new terms into it after translation; on conflict the established
 * translation wins and the conflict is reported, so terminology never
 * drifts mid-series.
 */

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::file_utils::FileManager;

/// How many new terms a chapter entry highlights
const KEY_TERM_LIMIT: usize = 10;

/// Identity and progress of the series this glossary belongs to
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesInfo {
    /// Series name, e.g. "Project_Skylark_Bridges"
    pub name: String,

    /// Highest chapter number merged so far
    pub completed_chapters: u32,

    /// Slug of the chapter merged last, e.g. "chapter_02_basic_logic"
    pub last_updated_chapter: String,
}

/// Per-chapter record of what the chapter contributed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChapterAdditions {
    /// Topics the chapter concentrates on
    #[serde(default)]
    pub focus_areas: Vec<String>,

    /// The first few new terms the chapter introduced
    #[serde(default)]
    pub key_new_terms: Vec<String>,
}

/// A term whose proposed translation disagrees with the established one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermConflict {
    /// The source term
    pub term: String,

    /// Translation already in the glossary
    pub established: String,

    /// Translation the chapter proposed
    pub proposed: String,
}

/// Outcome of merging a chapter's terms into the glossary
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    /// Terms added to the glossary
    pub added: usize,

    /// Terms already present with the same translation
    pub unchanged: usize,

    /// Terms where the chapter disagreed with the glossary
    pub conflicts: Vec<TermConflict>,
}

impl MergeReport {
    /// Whether any term disagreed with the established translation
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// The glossary file for one tutorial series
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesGlossary {
    /// Series identity and progress
    pub series_info: SeriesInfo,

    /// Established term translations, shared by every chapter
    #[serde(default)]
    pub consistent_translations: BTreeMap<String, String>,

    /// What each chapter contributed, keyed by "chapter_NN"
    #[serde(default)]
    pub chapter_specific_additions: BTreeMap<String, ChapterAdditions>,

    /// How each node is used in this series, for reader-facing context
    #[serde(default)]
    pub node_specific_contexts: BTreeMap<String, String>,
}

impl SeriesGlossary {
    /// Empty glossary for a named series
    pub fn new(series_name: &str) -> Self {
        SeriesGlossary {
            series_info: SeriesInfo {
                name: series_name.to_string(),
                completed_chapters: 0,
                last_updated_chapter: String::new(),
            },
            ..SeriesGlossary::default()
        }
    }

    /// Load a glossary from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = FileManager::read_to_string(path)?;
        let glossary: SeriesGlossary = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse series glossary: {}", path.display()))?;

        debug!(
            "Loaded glossary for {} with {} established terms",
            glossary.series_info.name,
            glossary.consistent_translations.len()
        );

        Ok(glossary)
    }

    /// Save the glossary as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        FileManager::write_to_file(path, &json)
    }

    /// Established translation for a term, if any
    pub fn translation_for(&self, term: &str) -> Option<&str> {
        self.consistent_translations.get(term).map(|s| s.as_str())
    }

    /// Whether a term is already established
    pub fn has_term(&self, term: &str) -> bool {
        self.consistent_translations.contains_key(term)
    }

    /// Series-specific usage context for a node, if recorded
    pub fn node_context(&self, node_name: &str) -> Option<&str> {
        self.node_specific_contexts.get(node_name).map(|s| s.as_str())
    }

    /// Record a node usage context
    pub fn set_node_context(&mut self, node_name: &str, context: &str) {
        self.node_specific_contexts
            .insert(node_name.to_string(), context.to_string());
    }

    /// Merge a finished chapter into the glossary.
    ///
    /// New terms are added; terms that already exist keep their established
    /// translation, and disagreements come back in the report. Series
    /// progress and the chapter's additions entry are updated either way.
    pub fn record_chapter(
        &mut self,
        chapter_number: u32,
        chapter_slug: &str,
        new_terms: &BTreeMap<String, String>,
        focus_areas: Vec<String>,
    ) -> MergeReport {
        let mut report = MergeReport::default();

        for (term, translation) in new_terms {
            match self.consistent_translations.get(term) {
                None => {
                    self.consistent_translations
                        .insert(term.clone(), translation.clone());
                    report.added += 1;
                }
                Some(established) if established == translation => {
                    report.unchanged += 1;
                }
                Some(established) => {
                    report.conflicts.push(TermConflict {
                        term: term.clone(),
                        established: established.clone(),
                        proposed: translation.clone(),
                    });
                }
            }
        }

        for conflict in &report.conflicts {
            warn!(
                "Glossary conflict for {:?}: keeping {:?}, chapter proposed {:?}",
                conflict.term, conflict.established, conflict.proposed
            );
        }

        self.series_info.completed_chapters = self.series_info.completed_chapters.max(chapter_number);
        self.series_info.last_updated_chapter = chapter_slug.to_string();

        let key_new_terms: Vec<String> = new_terms.keys().take(KEY_TERM_LIMIT).cloned().collect();
        self.chapter_specific_additions.insert(
            format!("chapter_{:02}", chapter_number),
            ChapterAdditions {
                focus_areas,
                key_new_terms,
            },
        );

        debug!(
            "Recorded chapter {} into glossary: {} added, {} unchanged, {} conflicts",
            chapter_number,
            report.added,
            report.unchanged,
            report.conflicts.len()
        );

        report
    }

    /// Find terms where a dictionary disagrees with the glossary
    pub fn conflicts_with(&self, terms: &BTreeMap<String, String>) -> Vec<TermConflict> {
        let mut conflicts = Vec::new();
        for (term, translation) in terms {
            if let Some(established) = self.consistent_translations.get(term) {
                if established != translation {
                    conflicts.push(TermConflict {
                        term: term.clone(),
                        established: established.clone(),
                        proposed: translation.clone(),
                    });
                }
            }
        }
        conflicts
    }

    /// Number of established terms
    pub fn term_count(&self) -> usize {
        self.consistent_translations.len()
    }
}
