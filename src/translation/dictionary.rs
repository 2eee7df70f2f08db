/*!
 * Tiered lookup dictionary.
 *
 * Translation proceeds through four tiers, stopping at the first one that
 * changes the text: an exact match on the whole segment, the first matching
 * phrase rule, established term substitution, and finally coarse sentence
 * patterns. The tier that fired is reported so callers can track coverage.
 */

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::file_utils::FileManager;

/// Which dictionary tier produced a translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    /// Whole segment matched the full-text table
    Exact,

    /// A phrase rule fired
    Phrase,

    /// Established terms were substituted
    Term,

    /// Only coarse sentence patterns applied
    Pattern,

    /// Nothing in the dictionary touched the text
    Miss,
}

/// An ordered find/replace rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseRule {
    /// Source text to look for
    pub find: String,

    /// Replacement text
    pub replace: String,
}

impl PhraseRule {
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        PhraseRule {
            find: find.into(),
            replace: replace.into(),
        }
    }
}

/// Four-tier translation dictionary.
///
/// `full_text` and `terms` are unordered maps; `phrases` and `patterns` keep
/// their order because the first matching phrase wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dictionary {
    /// Whole-segment translations, keyed by the trimmed source text
    #[serde(default)]
    pub full_text: HashMap<String, String>,

    /// Phrase rules, applied first-match-only
    #[serde(default)]
    pub phrases: Vec<PhraseRule>,

    /// Established term translations, applied longest-first
    #[serde(default)]
    pub terms: BTreeMap<String, String>,

    /// Coarse sentence patterns used when nothing else matched
    #[serde(default)]
    pub patterns: Vec<PhraseRule>,
}

impl Dictionary {
    /// Empty dictionary
    pub fn new() -> Self {
        Dictionary::default()
    }

    /// Dictionary preloaded with the established terminology and sentence
    /// patterns shared across the tutorial series. Full-text entries are
    /// chapter data and come from JSON files instead.
    pub fn builtin() -> Self {
        let mut dictionary = Dictionary::new();

        for (find, replace) in [
            // Core Houdini terms
            ("spline", "スプライン"),
            ("curve", "カーブ"),
            ("node", "ノード"),
            ("points", "ポイント"),
            ("primitives", "プリミティブ"),
            ("attributes", "アトリビュート"),
            ("geometry", "ジオメトリ"),
            ("surface", "サーフェス"),
            ("normal", "法線"),
            ("orientation", "方向"),
            ("scale", "スケール"),
            ("randomization", "ランダム化"),
            ("noise", "ノイズ"),
            ("ray casting", "レイキャスティング"),
            ("bounding box", "バウンディングボックス"),
            ("procedural", "プロシージャル"),
            // Bridge terms
            ("bridge", "橋"),
            ("plank", "板材"),
            ("wooden plank", "木製板材"),
            ("hanging bridge", "吊り橋"),
            ("staircase", "階段"),
            ("environment", "環境"),
            ("landscape", "ランドスケープ"),
            ("placeholder", "プレースホルダー"),
            // Technical actions
            ("resample", "リサンプル"),
            ("snap to", "にスナップ"),
            ("snap", "スナップ"),
            ("offset", "オフセット"),
            ("minimum distance", "最小距離"),
            ("maximum distance", "最大距離"),
            ("intersect", "交差"),
            ("projection", "投影"),
            // Workflow terms
            ("tool", "ツール"),
            ("workflow", "ワークフロー"),
            ("context", "コンテキスト"),
            ("preview", "プレビュー"),
            ("display", "表示"),
            ("viewport", "ビューポート"),
            ("spreadsheet", "スプレッドシート"),
            ("distance", "距離"),
        ] {
            dictionary.terms.insert(find.to_string(), replace.to_string());
        }

        dictionary.patterns = vec![
            PhraseRule::new("So ", "では、"),
            PhraseRule::new("And ", "そして、"),
            PhraseRule::new("But ", "しかし、"),
            PhraseRule::new("Now ", "今度は、"),
            PhraseRule::new("Well ", "さて、"),
            PhraseRule::new("OK", "わかりました"),
            PhraseRule::new("Alright", "よし"),
            PhraseRule::new("Let me ", "では"),
            PhraseRule::new("I'm gonna ", "私は"),
            PhraseRule::new("you can see", "ご覧いただけます"),
            PhraseRule::new("we can", "私たちは"),
            PhraseRule::new("what we want", "望むもの"),
            PhraseRule::new("like this", "このような"),
            PhraseRule::new("something like", "次のような"),
        ];

        dictionary
    }

    /// Load a dictionary from a JSON file. Absent sections default to empty.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = FileManager::read_to_string(path)?;
        let dictionary: Dictionary = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse dictionary: {}", path.display()))?;

        debug!(
            "Loaded dictionary from {}: {} full-text, {} phrases, {} terms, {} patterns",
            path.display(),
            dictionary.full_text.len(),
            dictionary.phrases.len(),
            dictionary.terms.len(),
            dictionary.patterns.len()
        );

        Ok(dictionary)
    }

    /// Merge term translations into the terms tier, overwriting existing
    /// entries. Used to enforce series glossary terminology.
    pub fn extend_terms(&mut self, terms: &BTreeMap<String, String>) {
        for (term, translation) in terms {
            self.terms.insert(term.clone(), translation.clone());
        }
        debug!("Extended dictionary terms tier to {} entries", self.terms.len());
    }

    /// Translate one segment, reporting which tier fired.
    ///
    /// The phrase tier stops after its first match; the term tier only runs
    /// when no phrase matched; the pattern tier only runs when the text is
    /// still untouched.
    pub fn translate(&self, text: &str) -> (String, MatchTier) {
        if let Some(translation) = self.full_text.get(text.trim()) {
            return (translation.clone(), MatchTier::Exact);
        }

        let mut result = text.to_string();

        for rule in &self.phrases {
            if result.contains(&rule.find) {
                result = result.replace(&rule.find, &rule.replace);
                return (result, MatchTier::Phrase);
            }
        }

        // Longest terms first so that short terms cannot clobber longer
        // ones that contain them ("snap" inside "snap to")
        let mut terms: Vec<(&String, &String)> = self.terms.iter().collect();
        terms.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        for (term, translation) in terms {
            result = result.replace(term.as_str(), translation.as_str());
        }
        if result != text {
            return (result, MatchTier::Term);
        }

        for rule in &self.patterns {
            result = result.replace(&rule.find, &rule.replace);
        }
        if result != text {
            (result, MatchTier::Pattern)
        } else {
            (result, MatchTier::Miss)
        }
    }

    /// Number of entries across all tiers
    pub fn len(&self) -> usize {
        self.full_text.len() + self.phrases.len() + self.terms.len() + self.patterns.len()
    }

    /// Whether every tier is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-tier translation statistics for one file
#[derive(Clone)]
pub struct TranslationStats {
    /// Segments processed
    pub segments: u64,

    /// Whole-segment matches
    pub exact_matches: u64,

    /// Phrase rule matches
    pub phrase_matches: u64,

    /// Term substitution matches
    pub term_matches: u64,

    /// Pattern fallback matches
    pub pattern_matches: u64,

    /// Segments left untouched
    pub untranslated: u64,

    /// Start time of stat tracking
    pub start_time: Instant,

    /// Total time spent translating
    pub processing_duration: Duration,
}

impl Default for TranslationStats {
    fn default() -> Self {
        Self::new()
    }
}

impl TranslationStats {
    /// Create a new empty stats instance
    pub fn new() -> Self {
        Self {
            segments: 0,
            exact_matches: 0,
            phrase_matches: 0,
            term_matches: 0,
            pattern_matches: 0,
            untranslated: 0,
            start_time: Instant::now(),
            processing_duration: Duration::from_secs(0),
        }
    }

    /// Record one translated segment
    pub fn record(&mut self, tier: MatchTier) {
        self.segments += 1;
        match tier {
            MatchTier::Exact => self.exact_matches += 1,
            MatchTier::Phrase => self.phrase_matches += 1,
            MatchTier::Term => self.term_matches += 1,
            MatchTier::Pattern => self.pattern_matches += 1,
            MatchTier::Miss => self.untranslated += 1,
        }
    }

    /// Merge counts from another stats instance
    pub fn merge(&mut self, other: &TranslationStats) {
        self.segments += other.segments;
        self.exact_matches += other.exact_matches;
        self.phrase_matches += other.phrase_matches;
        self.term_matches += other.term_matches;
        self.pattern_matches += other.pattern_matches;
        self.untranslated += other.untranslated;
        self.processing_duration += other.processing_duration;
    }

    /// Fraction of segments any tier touched, as a percentage
    pub fn coverage_percent(&self) -> f64 {
        if self.segments == 0 {
            return 100.0;
        }
        let translated = self.segments - self.untranslated;
        (translated as f64 / self.segments as f64) * 100.0
    }

    /// Generate a summary of translation coverage
    pub fn summary(&self) -> String {
        let elapsed = if self.processing_duration.as_secs_f64() > 0.0 {
            self.processing_duration
        } else {
            self.start_time.elapsed()
        };

        format!(
            "Translation Summary:\n\
             Segments: {}\n\
             Exact matches: {}\n\
             Phrase matches: {}\n\
             Term matches: {}\n\
             Pattern fallbacks: {}\n\
             Untranslated: {}\n\
             Coverage: {:.1}%\n\
             Elapsed time: {:.2} seconds",
            self.segments,
            self.exact_matches,
            self.phrase_matches,
            self.term_matches,
            self.pattern_matches,
            self.untranslated,
            self.coverage_percent(),
            elapsed.as_secs_f64()
        )
    }
}
