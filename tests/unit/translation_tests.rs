/*!
 * Tests covering both halves of the translation machinery:
 * - dictionary: Tiered phrase and term lookup with per-tier statistics
 * - glossary: Cross-chapter series glossary accumulation
 */

use std::collections::BTreeMap;
use anyhow::Result;
use subguide::translation::{Dictionary, MatchTier, SeriesGlossary, TranslationStats};
use crate::common;

/// Test loading a dictionary from a JSON file with partial sections
#[test]
fn test_dictionary_from_json_file_withPartialSections_shouldDefaultMissingOnes() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let content = r#"{
  "full_text": {
    "How do we do that?": "どうすればよいでしょうか？"
  },
  "terms": {
    "bridge": "橋"
  }
}"#;
    let dict_file =
        common::create_test_file(&temp_dir.path().to_path_buf(), "chapter_dict.json", content)?;

    let dictionary = Dictionary::from_json_file(&dict_file)?;

    assert_eq!(dictionary.full_text.len(), 1);
    assert_eq!(dictionary.terms.len(), 1);
    assert!(dictionary.phrases.is_empty());
    assert!(dictionary.patterns.is_empty());

    let (text, tier) = dictionary.translate("How do we do that?");
    assert_eq!(tier, MatchTier::Exact);
    assert_eq!(text, "どうすればよいでしょうか？");

    Ok(())
}

/// Test that a malformed dictionary file is a load error
#[test]
fn test_dictionary_from_json_file_withMalformedJson_shouldReturnError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dict_file =
        common::create_test_file(&temp_dir.path().to_path_buf(), "broken.json", "{not json")?;

    assert!(Dictionary::from_json_file(&dict_file).is_err());

    Ok(())
}

/// Test that glossary terms merged into a dictionary take precedence
#[test]
fn test_dictionary_extend_terms_withGlossaryTerms_shouldApplyThem() {
    let mut dictionary = Dictionary::builtin();
    let mut glossary_terms = BTreeMap::new();
    glossary_terms.insert("ray casting".to_string(), "レイキャスト".to_string());

    dictionary.extend_terms(&glossary_terms);

    let (text, tier) = dictionary.translate("use ray casting here");
    assert_eq!(tier, MatchTier::Term);
    assert!(text.contains("レイキャスト"));
}

/// Test merging per-file stats into run totals
#[test]
fn test_translationStats_merge_shouldAccumulateAllCounters() {
    let mut totals = TranslationStats::new();
    let mut file_one = TranslationStats::new();
    file_one.record(MatchTier::Exact);
    file_one.record(MatchTier::Term);
    let mut file_two = TranslationStats::new();
    file_two.record(MatchTier::Miss);

    totals.merge(&file_one);
    totals.merge(&file_two);

    assert_eq!(totals.segments, 3);
    assert_eq!(totals.exact_matches, 1);
    assert_eq!(totals.term_matches, 1);
    assert_eq!(totals.untranslated, 1);
}

/// Test that coverage is 100% for an empty stats instance
#[test]
fn test_translationStats_coverage_withNoSegments_shouldBeFull() {
    let stats = TranslationStats::new();
    assert_eq!(stats.coverage_percent(), 100.0);
}

/// Test glossary persistence through save and from_file
#[test]
fn test_seriesGlossary_save_and_from_file_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let glossary_file = temp_dir.path().join("series_glossary.json");

    let mut glossary = SeriesGlossary::new("Project_Skylark_Bridges");
    let mut terms = BTreeMap::new();
    terms.insert("spline".to_string(), "スプライン".to_string());
    terms.insert("up vector".to_string(), "アップベクトル".to_string());
    glossary.record_chapter(
        2,
        "chapter_02_basic_logic",
        &terms,
        vec!["VEX Programming Introduction".to_string()],
    );
    glossary.save(&glossary_file)?;

    let loaded = SeriesGlossary::from_file(&glossary_file)?;

    assert_eq!(loaded.series_info.name, "Project_Skylark_Bridges");
    assert_eq!(loaded.series_info.completed_chapters, 2);
    assert_eq!(loaded.series_info.last_updated_chapter, "chapter_02_basic_logic");
    assert_eq!(loaded.term_count(), 2);
    assert_eq!(loaded.translation_for("spline"), Some("スプライン"));
    assert!(loaded.chapter_specific_additions.contains_key("chapter_02"));

    Ok(())
}

/// Test that an established glossary translation survives later chapters
#[test]
fn test_seriesGlossary_record_chapter_acrossChapters_shouldKeepFirstTranslation() {
    let mut glossary = SeriesGlossary::new("Project_Skylark_Bridges");

    let mut chapter_two = BTreeMap::new();
    chapter_two.insert("spline".to_string(), "スプライン".to_string());
    glossary.record_chapter(2, "chapter_02_basic_logic", &chapter_two, vec![]);

    let mut chapter_three = BTreeMap::new();
    chapter_three.insert("spline".to_string(), "曲線".to_string());
    let report = glossary.record_chapter(3, "chapter_03_bridge_structure", &chapter_three, vec![]);

    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(glossary.translation_for("spline"), Some("スプライン"));
    assert_eq!(glossary.series_info.completed_chapters, 3);
}

/// Test driving the dictionary with glossary terms loaded from disk
#[test]
fn test_dictionary_with_glossary_fromDisk_shouldEnforceSeriesTerminology() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let glossary_file = temp_dir.path().join("glossary.json");

    let mut glossary = SeriesGlossary::new("Project_Skylark_Bridges");
    let mut terms = BTreeMap::new();
    terms.insert("plank".to_string(), "プランク".to_string());
    glossary.record_chapter(1, "chapter_01_introduction", &terms, vec![]);
    glossary.save(&glossary_file)?;

    let loaded = SeriesGlossary::from_file(&glossary_file)?;
    let mut dictionary = Dictionary::builtin();
    dictionary.extend_terms(&loaded.consistent_translations);

    // The glossary overrides the builtin translation for the series
    let (text, _) = dictionary.translate("place a plank");
    assert!(text.contains("プランク"));

    Ok(())
}
