/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::path::Path;

use opensubtrans::file_utils::{FileManager, FileType};

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

#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

#[test]
fn test_generate_output_path_withValidInputs_shouldCreateCorrectPath() {
    let output_path = FileManager::generate_output_path(Path::new("/tmp/input/movie.srt"), Path::new("/tmp/output"), "fr", "srt");
    assert_eq!(output_path, Path::new("/tmp/output/movie.fr.srt"));
}

#[test]
fn test_outputPaths_shouldShareStemAndLanguage() {
    let paths = FileManager::output_paths("/subs/show.s01e01.en.srt", "/out", "zh-TW");

    assert_eq!(paths.translated, Path::new("/out/show.s01e01.en.zh-TW.srt"));
    assert_eq!(paths.terms, Path::new("/out/show.s01e01.en.zh-TW.terms.json"));
    assert_eq!(paths.partial, Path::new("/out/show.s01e01.en.zh-TW.partial.srt"));
}

#[test]
fn test_writeToFile_withMissingParent_shouldCreateDirectories() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("a/b/c.txt");

    FileManager::write_to_file(&path, "hello")?;

    assert_eq!(FileManager::read_to_string(&path)?, "hello");
    FileManager::remove_if_exists(&path)?;
    assert!(!path.exists());
    FileManager::remove_if_exists(&path)?;
    Ok(())
}

#[test]
fn test_findSourceSubtitles_shouldSkipOwnOutputs() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    common::create_test_subtitle(dir, "b.srt")?;
    common::create_test_subtitle(dir, "a.srt")?;
    common::create_test_subtitle(dir, "a.fr.srt")?;
    common::create_test_subtitle(dir, "a.fr.partial.srt")?;
    common::create_test_file(dir, "notes.txt", "not a subtitle")?;
    std::fs::create_dir(dir.join("season2"))?;
    common::create_test_subtitle(&dir.join("season2"), "c.SRT")?;

    let files = FileManager::find_source_subtitles(dir, "fr")?;
    let names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();

    assert_eq!(names, vec!["a.srt", "b.srt", "c.SRT"]);
    Ok(())
}

#[test]
fn test_detectFileType_shouldRecognizeSrtByExtensionOrContent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let by_extension = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let by_content = common::create_test_subtitle(temp_dir.path(), "movie.txt")?;
    let other = common::create_test_file(temp_dir.path(), "readme.md", "# hello")?;

    assert_eq!(FileManager::detect_file_type(&by_extension)?, FileType::Subtitle);
    assert_eq!(FileManager::detect_file_type(&by_content)?, FileType::Subtitle);
    assert_eq!(FileManager::detect_file_type(&other)?, FileType::Unknown);
    assert!(FileManager::detect_file_type(temp_dir.path().join("missing.srt")).is_err());
    Ok(())
}
