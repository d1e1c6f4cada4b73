use anyhow::{Result, Context};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::subtitle_processor::validate_srt_content;

// @module: File and directory utilities

// @struct: Files written for one translated input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// `{stem}.{lang}.srt`
    pub translated: PathBuf,
    /// `{stem}.{lang}.terms.json`
    pub terms: PathBuf,
    /// `{stem}.{lang}.partial.srt`
    pub partial: PathBuf,
}

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
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Output path for translated subtitle
    // @params: input_file, output_dir, target_language, extension
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        target_language: &str,
        extension: &str,
    ) -> PathBuf {
        let stem = input_file.as_ref().file_stem().unwrap_or_default();

        let mut output_filename = stem.to_string_lossy().to_string();
        output_filename.push('.');
        output_filename.push_str(target_language);
        output_filename.push('.');
        output_filename.push_str(extension);

        output_dir.as_ref().join(output_filename)
    }

    // @generates: Every artifact path for one input
    pub fn output_paths<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        target_language: &str,
    ) -> OutputPaths {
        let input_file = input_file.as_ref();
        let output_dir = output_dir.as_ref();
        OutputPaths {
            translated: Self::generate_output_path(input_file, output_dir, target_language, "srt"),
            terms: Self::generate_output_path(input_file, output_dir, target_language, "terms.json"),
            partial: Self::generate_output_path(input_file, output_dir, target_language, "partial.srt"),
        }
    }

    /// Find files with a specific extension in a directory
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let extension = extension.trim_start_matches('.');
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true).sort_by_file_name() {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            let matches = path
                .extension()
                .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension));
            if path.is_file() && matches {
                result.push(path.to_path_buf());
            }
        }

        Ok(result)
    }

    /// Find source subtitles in a directory, skipping files this tool wrote
    /// for `target_language`
    pub fn find_source_subtitles<P: AsRef<Path>>(dir: P, target_language: &str) -> Result<Vec<PathBuf>> {
        let translated_suffix = format!(".{}", target_language.to_lowercase());
        let partial_suffix = format!(".{}.partial", target_language.to_lowercase());

        Ok(Self::find_files(dir, "srt")?
            .into_iter()
            .filter(|path| {
                let stem = path.file_stem().unwrap_or_default().to_string_lossy().to_lowercase();
                !stem.ends_with(&translated_suffix) && !stem.ends_with(&partial_suffix)
            })
            .collect())
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))
    }

    /// Remove a file if it exists
    pub fn remove_if_exists<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if path.is_file() {
            fs::remove_file(path).with_context(|| format!("Failed to remove file: {:?}", path))?;
        }
        Ok(())
    }

    /// Detect if a file is a subtitle file (SRT)
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> Result<FileType> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow::anyhow!("File does not exist: {:?}", path));
        }

        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("srt")) {
            return Ok(FileType::Subtitle);
        }

        // Fall back to examining file contents
        match fs::read_to_string(path) {
            Ok(content) if validate_srt_content(&content) => Ok(FileType::Subtitle),
            _ => Ok(FileType::Unknown),
        }
    }
}

/// Enum representing different file types
#[derive(Debug, PartialEq, Eq)]
pub enum FileType {
    /// Subtitle file (SRT)
    Subtitle,
    /// Unknown file type
    Unknown,
}
