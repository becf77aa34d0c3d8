use anyhow::{Result, Context};
use std::fs;
use std::path::{Path, PathBuf};
use once_cell::sync::Lazy;
use regex::Regex;

// @module: File and output-path utilities

// @const: Characters that are illegal in filenames
static ILLEGAL_FILENAME_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[<>:"/\\|?*]"#).unwrap()
});

/// Maximum length of a derived output filename stem, in characters
const MAX_FILENAME_CHARS: usize = 100;

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    /// Remove a file when present, ignoring a missing one
    pub fn remove_file_if_exists<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if path.exists() {
            fs::remove_file(path)
                .with_context(|| format!("Failed to remove file: {}", path.display()))?;
        }
        Ok(())
    }

    /// Strip characters that are illegal in filenames, trim whitespace and
    /// truncate to a workable length (on character boundaries)
    pub fn sanitize_filename(name: &str) -> String {
        let cleaned = ILLEGAL_FILENAME_CHARS.replace_all(name, "");
        let trimmed = cleaned.trim();

        let truncated: String = trimmed.chars().take(MAX_FILENAME_CHARS).collect();
        let truncated = truncated.trim_end().to_string();

        if truncated.is_empty() {
            "video".to_string()
        } else {
            truncated
        }
    }

    // @generates: Default output subtitle path next to the video
    // @params: video_path, title from container metadata (falls back to the file stem)
    pub fn derive_output_path(video_path: &Path, title: Option<&str>) -> PathBuf {
        let stem = title
            .map(|t| t.to_string())
            .or_else(|| video_path.file_stem().map(|s| s.to_string_lossy().to_string()))
            .unwrap_or_else(|| "video".to_string());

        let filename = format!("{}.srt", Self::sanitize_filename(&stem));

        let dir = video_path.parent().unwrap_or_else(|| Path::new("."));
        dir.join(filename)
    }
}
