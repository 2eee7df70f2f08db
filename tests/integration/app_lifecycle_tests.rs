/*!
 * End-to-end tests for the controller pipeline
 */

use std::fs;
use anyhow::Result;
use tokio_test;
use subguide::app_controller::Controller;
use subguide::app_config::Config;
use subguide::subtitle_processor::SubtitleCollection;
use subguide::translation::SeriesGlossary;
use crate::common;

/// Test that a controller comes up on the default config
#[test]
fn test_controller_initialization_withDefaultConfig_shouldSucceed() -> Result<()> {
    let controller = Controller::new_for_test()?;
    assert!(controller.is_initialized());
    Ok(())
}

/// Test that a controller accepts a caller-supplied config
#[test]
fn test_controller_with_custom_config_shouldInitializeWithoutErrors() -> Result<()> {
    let mut config = Config::default();
    config.source_language = "en".to_string();
    config.target_language = "fr".to_string();

    let controller = Controller::with_config(config)?;
    assert!(controller.is_initialized());
    Ok(())
}

/// Test a full single-chapter run including glossary tracking
#[test]
fn test_run_withChapterLayout_shouldProduceArtifactsAndGlossary() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let chapter_dir = temp_dir
        .path()
        .join("tutorials")
        .join("Project_Skylark_Bridges")
        .join("chapter_01_introduction");
    fs::create_dir_all(&chapter_dir)?;
    let input = common::create_fragmented_subtitle(&chapter_dir, "transcript_1068502038.srt")?;

    let glossary_path = temp_dir.path().join("series_glossary.json");
    let mut config = Config::default();
    config.translation.glossary_path = Some(glossary_path.clone());

    let controller = Controller::with_config(config)?;
    let result = tokio_test::block_on(async {
        controller.run(input.clone(), chapter_dir.clone(), true).await
    });
    assert!(result.is_ok(), "Single-chapter run should complete without errors");

    // All chapter artifacts are written beside the transcript
    assert!(chapter_dir.join("transcript_1068502038_fixed.srt").exists());
    assert!(chapter_dir.join("transcript_1068502038_japanese.srt").exists());
    assert!(chapter_dir.join("transcript_1068502038_guide.md").exists());
    assert!(chapter_dir.join("transcript_1068502038_guide.html").exists());

    // The guide carries the series context parsed from the path
    let guide = fs::read_to_string(chapter_dir.join("transcript_1068502038_guide.md"))?;
    assert!(guide.contains("Project Skylark Bridges"));
    assert!(guide.contains("導入"));
    assert!(guide.contains("https://vimeo.com/1068502038"));

    // The translated transcript parses back as one merged segment
    let translated = SubtitleCollection::from_srt_file(
        &chapter_dir.join("transcript_1068502038_japanese.srt"),
        "ja",
    )?;
    assert_eq!(translated.entries.len(), 1);

    // Established terms from the chapter text land in the series glossary
    let glossary = SeriesGlossary::from_file(&glossary_path)?;
    assert_eq!(glossary.series_info.name, "Project Skylark Bridges");
    assert_eq!(glossary.series_info.completed_chapters, 1);
    assert!(glossary.has_term("node"));
    assert!(glossary.has_term("noise"));
    Ok(())
}

/// Test processing a whole series directory with per-chapter outputs
#[test]
fn test_run_series_withMultipleChapters_shouldProcessAllAndLog() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let series_dir = temp_dir
        .path()
        .join("tutorials")
        .join("Project_Skylark_Bridges");
    let chapter_one = series_dir.join("chapter_01_introduction");
    let chapter_two = series_dir.join("chapter_02_basic_logic");
    fs::create_dir_all(&chapter_one)?;
    fs::create_dir_all(&chapter_two)?;

    common::create_fragmented_subtitle(&chapter_one, "transcript_1068502038.srt")?;
    common::create_test_mentions(&chapter_one, "transcript_1068502038_mentions.json")?;
    common::create_test_subtitle(&chapter_two, "transcript_1096045116.srt")?;

    let glossary_path = temp_dir.path().join("series_glossary.json");
    let mut config = Config::default();
    config.translation.glossary_path = Some(glossary_path.clone());

    let controller = Controller::with_config(config)?;
    let result = tokio_test::block_on(async {
        controller.run_series(series_dir.clone(), false).await
    });
    assert!(result.is_ok(), "Series run should complete without errors");

    // Each chapter writes its artifacts next to its own transcript
    assert!(chapter_one.join("transcript_1068502038_japanese.srt").exists());
    assert!(chapter_one.join("transcript_1068502038_guide.html").exists());
    assert!(chapter_one.join("transcript_1068502038_node_insertions.json").exists());
    assert!(chapter_two.join("transcript_1096045116_japanese.srt").exists());
    assert!(chapter_two.join("transcript_1096045116_guide.html").exists());

    // Mention metadata turns into guide annotations
    let annotated_guide = fs::read_to_string(chapter_one.join("transcript_1068502038_guide.md"))?;
    assert!(annotated_guide.contains("Grid SOP"));

    // Both chapters are recorded in the series glossary
    let glossary = SeriesGlossary::from_file(&glossary_path)?;
    assert_eq!(glossary.series_info.completed_chapters, 2);
    assert!(glossary.chapter_specific_additions.contains_key("chapter_01"));
    assert!(glossary.chapter_specific_additions.contains_key("chapter_02"));

    // The run summary is appended to the processing log
    let log_path = series_dir.join("subguide.log");
    assert!(log_path.exists(), "Processing log should be written");
    let log = fs::read_to_string(&log_path)?;
    assert!(log.contains("2 processed, 0 skipped, 0 errors"));

    // A second run without force leaves existing translations alone
    let rerun = tokio_test::block_on(async {
        controller.run_series(series_dir.clone(), false).await
    });
    assert!(rerun.is_ok());
    let log = fs::read_to_string(&log_path)?;
    assert!(log.contains("0 processed, 2 skipped, 0 errors"));
    Ok(())
}

/// Test that a series directory without transcripts is an error
#[test]
fn test_run_series_withNoTranscripts_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let empty_dir = temp_dir.path().join("empty_series");
    fs::create_dir_all(&empty_dir)?;

    let controller = Controller::new_for_test()?;
    let result = tokio_test::block_on(async {
        controller.run_series(empty_dir, false).await
    });
    assert!(result.is_err(), "Series run without transcripts should fail");
    Ok(())
}

/// Test that a missing input file fails a single run
#[test]
fn test_run_withMissingInput_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let missing = temp_dir.path().join("transcript_404.srt");

    let controller = Controller::new_for_test()?;
    let result = tokio_test::block_on(async {
        controller.run(missing, temp_dir.path().to_path_buf(), true).await
    });
    assert!(result.is_err(), "Missing input should fail the run");
    Ok(())
}
