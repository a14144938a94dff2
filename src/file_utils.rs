use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::cue::Cue;
use crate::formats::{self, SubtitleFormat};

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Sibling path with a new extension
    // @params: input_file, output_dir (None keeps the input's directory), extension
    pub fn generate_output_path<P: AsRef<Path>>(input_file: P, output_dir: Option<&Path>, extension: &str) -> PathBuf {
        let input_file = input_file.as_ref();
        let stem = input_file.file_stem().unwrap_or_default().to_string_lossy();
        let file_name = format!("{}.{}", stem, extension.trim_start_matches('.'));

        match output_dir {
            Some(dir) => dir.join(file_name),
            None => input_file.with_file_name(file_name),
        }
    }

    /// Find subtitle files (by extension) under a directory
    pub fn find_subtitle_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() && SubtitleFormat::from_path(path).is_some() {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content).with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Read and decode a subtitle file. The extension picks the codec when it
    /// names a known format; otherwise the content is sniffed.
    pub fn read_subtitle_file<P: AsRef<Path>>(path: P) -> Result<(SubtitleFormat, Vec<Cue>)> {
        let path = path.as_ref();
        let content = Self::read_to_string(path)?;

        match SubtitleFormat::from_path(path) {
            Some(format) => {
                debug!("Decoding {:?} as {}", path, format);
                let cues = format
                    .codec()
                    .decode(&content)
                    .with_context(|| format!("Failed to parse {} file: {:?}", format, path))?;
                Ok((format, cues))
            }
            None => formats::detect_and_decode(&content)
                .with_context(|| format!("Failed to detect subtitle format of {:?}", path)),
        }
    }
}
