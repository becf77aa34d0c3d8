/*!
 * Tests for file and output-path utilities
 */

use std::path::Path;
use anyhow::Result;
use subtier::file_utils::FileManager;
use crate::common;

/// Test sanitization of characters that are illegal in filenames
#[test]
fn test_sanitize_filename_withIllegalChars_shouldStripThem() {
    assert_eq!(
        FileManager::sanitize_filename(r#"a<b>c:d"e/f\g|h?i*j"#),
        "abcdefghij"
    );
    assert_eq!(FileManager::sanitize_filename("  padded title  "), "padded title");
}

/// Test that sanitization truncates to 100 characters on char boundaries
#[test]
fn test_sanitize_filename_withLongName_shouldTruncate() {
    let long = "x".repeat(250);
    assert_eq!(FileManager::sanitize_filename(&long).chars().count(), 100);

    // Multi-byte characters must not be split
    let unicode = "字".repeat(250);
    let sanitized = FileManager::sanitize_filename(&unicode);
    assert_eq!(sanitized.chars().count(), 100);
    assert!(sanitized.is_char_boundary(sanitized.len()));
}

/// Test the fallback for names that sanitize to nothing
#[test]
fn test_sanitize_filename_withOnlyIllegalChars_shouldFallBack() {
    assert_eq!(FileManager::sanitize_filename("<>:?*"), "video");
    assert_eq!(FileManager::sanitize_filename(""), "video");
}

/// Test output path derivation from a container title
#[test]
fn test_derive_output_path_withTitle_shouldUseSanitizedTitle() {
    let path = FileManager::derive_output_path(
        Path::new("/videos/abc123.mp4"),
        Some("Cooking: The Best Noodles?"),
    );
    assert_eq!(path, Path::new("/videos/Cooking The Best Noodles.srt"));
}

/// Test output path derivation without a title
#[test]
fn test_derive_output_path_withoutTitle_shouldUseFileStem() {
    let path = FileManager::derive_output_path(Path::new("/videos/abc123.mp4"), None);
    assert_eq!(path, Path::new("/videos/abc123.srt"));

    // A bare filename lands next to the working directory
    let path = FileManager::derive_output_path(Path::new("clip.mkv"), None);
    assert_eq!(path, Path::new("clip.srt"));
}

/// Test file removal helper
#[test]
fn test_remove_file_if_exists_shouldBeIdempotent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(&temp_dir.path().to_path_buf(), "a.srt", "data")?;

    assert!(path.exists());
    FileManager::remove_file_if_exists(&path)?;
    assert!(!path.exists());

    // Removing again is not an error
    FileManager::remove_file_if_exists(&path)?;
    Ok(())
}
