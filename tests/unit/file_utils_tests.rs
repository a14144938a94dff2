/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use subedit::file_utils::FileManager;
use subedit::formats::SubtitleFormat;
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "test_file_exists.tmp", "test content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::file_exists(temp_dir.path()));
    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

/// Test that generate_output_path swaps the extension
#[test]
fn test_generate_output_path_withOutputDir_shouldUseIt() {
    let output_path = FileManager::generate_output_path("/tmp/input/video.srt", Some(Path::new("/tmp/output")), "vtt");

    assert_eq!(output_path, PathBuf::from("/tmp/output/video.vtt"));
}

/// Test that write_to_file creates missing parent directories
#[test]
fn test_write_to_file_withNestedPath_shouldCreateParents() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("a").join("b").join("out.srt");

    FileManager::write_to_file(&nested, "content")?;

    assert_eq!(FileManager::read_to_string(&nested)?, "content");
    Ok(())
}

/// Test that subtitle discovery walks subdirectories
#[test]
fn test_find_subtitle_files_withNestedDirs_shouldFindAll() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let sub_dir = temp_dir.path().join("season1");
    fs::create_dir_all(&sub_dir)?;
    common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    common::create_test_file(&sub_dir, "episode.ass", "")?;
    common::create_test_file(&sub_dir, "notes.md", "")?;

    let files = FileManager::find_subtitle_files(temp_dir.path())?;

    assert_eq!(files.len(), 2);
    assert!(files.iter().any(|p| p.ends_with("season1/episode.ass")));
    Ok(())
}

/// Test reading a subtitle file by its extension
#[test]
fn test_read_subtitle_file_withSrt_shouldDecode() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;

    let (format, cues) = FileManager::read_subtitle_file(&path)?;

    assert_eq!(format, SubtitleFormat::Srt);
    assert_eq!(cues, common::sample_cues());
    Ok(())
}

/// Test that a mislabelled file reports the codec failure
#[test]
fn test_read_subtitle_file_withWrongExtension_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "movie.srt",
        "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nHi\n",
    )?;

    let error = FileManager::read_subtitle_file(&path).unwrap_err();

    assert!(format!("{:#}", error).contains("movie.srt"));
    Ok(())
}

/// Test that a missing file is an error
#[test]
fn test_read_to_string_withMissingFile_shouldFail() {
    assert!(FileManager::read_to_string("definitely_missing_12345.srt").is_err());
}
