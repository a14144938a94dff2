/*!
 * Integration tests for the load, edit and export workflow
 */

use anyhow::Result;

use subedit::analysis::{AnalysisReport, Readability};
use subedit::cue::{CueField, CuePosition};
use subedit::cue_store::CueStore;
use subedit::file_utils::FileManager;
use subedit::formats::{ExportFormat, SubtitleFormat};
use subedit::history::HistoryManager;
use crate::common;

/// Test a full session: read SRT, edit, undo, export to VTT and read it back
#[test]
fn test_editingWorkflow_withUndoAndExport_shouldSucceed() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;

    let (format, cues) = FileManager::read_subtitle_file(&input)?;
    assert_eq!(format, SubtitleFormat::Srt);

    let mut store = CueStore::new();
    let mut history = HistoryManager::new();
    store.load(cues);
    history.record("load", store.cues());

    store.set_field(1, CueField::Speaker(Some("Anna".to_string())))?;
    store.set_position(1, Some(CuePosition::Top))?;
    history.record("speaker", store.cues());

    store.delete(0)?;
    history.record("delete", store.cues());
    assert_eq!(store.len(), 2);

    let previous = history.undo().map(|cues| cues.to_vec()).unwrap_or_default();
    store.load(previous);
    assert_eq!(store.len(), 3);
    assert_eq!(store.cues()[1].speaker.as_deref(), Some("Anna"));

    let output = FileManager::generate_output_path(&input, None, ExportFormat::Vtt.extension());
    FileManager::write_to_file(&output, &ExportFormat::Vtt.render(store.cues())?)?;

    let (format, reread) = FileManager::read_subtitle_file(&output)?;
    assert_eq!(format, SubtitleFormat::Vtt);
    assert_eq!(reread.len(), 3);
    assert_eq!(reread[1].speaker.as_deref(), Some("Anna"));
    assert_eq!(reread[1].text, "It contains multiple entries.");
    Ok(())
}

/// Test repairing a messy file the way the `fix` command does
#[test]
fn test_fixWorkflow_withOverlapsAndCrossedTimes_shouldProduceCleanFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(
        temp_dir.path(),
        "messy.srt",
        "1\n00:00:05,000 --> 00:00:09,000\nlate\n\n2\n00:00:01,000 --> 00:00:06,000\nearly\n\n3\n00:00:12,000 --> 00:00:11,000\ncrossed\n",
    )?;

    let (_, cues) = FileManager::read_subtitle_file(&input)?;
    let mut store = CueStore::from_cues(cues);
    assert_eq!(AnalysisReport::analyze(store.cues()).overlaps.len(), 1);

    store.sort_by_start();
    assert_eq!(store.fix_negative_durations(), 1);
    assert_eq!(store.resolve_overlaps(), 1);

    let report = AnalysisReport::analyze(store.cues());
    assert!(report.overlaps.is_empty());
    assert_eq!(report.count(Readability::VeryFast), 0);
    assert!((store.cues()[0].end - 4.9).abs() < 1e-9);
    assert_eq!((store.cues()[2].start, store.cues()[2].end), (12.0, 13.0));

    let texts: Vec<&str> = store.cues().iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["early", "late", "crossed"]);
    Ok(())
}

/// Test every export format writes something readable
#[test]
fn test_exportAllFormats_shouldWriteFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let (_, cues) = FileManager::read_subtitle_file(&input)?;
    let out_dir = temp_dir.path().join("out");

    for format in [
        ExportFormat::Srt,
        ExportFormat::Vtt,
        ExportFormat::Ass,
        ExportFormat::Txt,
        ExportFormat::Csv,
        ExportFormat::Json,
    ] {
        let output = FileManager::generate_output_path(&input, Some(out_dir.as_path()), format.extension());
        FileManager::write_to_file(&output, &format.render(&cues)?)?;

        let content = FileManager::read_to_string(&output)?;
        assert!(content.contains("For testing purposes."), "{} output lost text", format);

        if let Some(subtitle_format) = format.subtitle_format() {
            let (detected, reread) = FileManager::read_subtitle_file(&output)?;
            assert_eq!(detected, subtitle_format);
            assert_eq!(reread.len(), cues.len());
        }
    }
    Ok(())
}
