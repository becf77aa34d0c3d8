/*!
 * Media probing and extraction built on the external ffprobe/ffmpeg tools.
 *
 * A `VideoAsset` is the read-only handle one extraction run works against:
 * probed once at open, it exposes the container duration, the stream table
 * and the title tag. The free functions drive ffmpeg for the per-tier
 * operations (subtitle stream extraction, frame capture, audio demuxing).
 */

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, anyhow};
use log::{debug, warn};
use serde_json::Value;
use tokio::process::Command;

use crate::errors::MediaError;
use crate::subtitle_processor::format_timestamp_secs;

/// Time budget for ffprobe metadata queries
const FFPROBE_TIMEOUT_SECS: u64 = 60;

/// Time budget for ffmpeg extraction/capture/demux operations
const FFMPEG_TIMEOUT_SECS: u64 = 120;

/// One entry of a container stream table
#[derive(Debug, Clone)]
pub struct StreamInfo {
    /// Absolute stream index within the container
    pub index: usize,

    /// Stream type reported by ffprobe ("video", "audio", "subtitle", ...)
    pub codec_type: String,

    /// Codec name reported by ffprobe
    pub codec_name: String,

    /// Language tag, when the container carries one
    pub language: Option<String>,
}

impl StreamInfo {
    /// Check if a subtitle codec is bitmap-based (cannot be converted to text SRT)
    pub fn is_bitmap_subtitle(&self) -> bool {
        matches!(
            self.codec_name.as_str(),
            "hdmv_pgs_subtitle" | "dvd_subtitle" | "dvb_subtitle" | "xsub"
        )
    }
}

/// Opaque handle to a media file, immutable for the lifetime of one run
#[derive(Debug, Clone)]
pub struct VideoAsset {
    path: PathBuf,
    duration_secs: Option<f64>,
    title: Option<String>,
    streams: Option<Vec<StreamInfo>>,
}

impl VideoAsset {
    /// Open a media file and probe its metadata
    ///
    /// Fails only when the file itself is missing. An unreadable stream
    /// table or duration leaves the corresponding accessor empty; the tiers
    /// decide how to degrade.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow!("Video file does not exist: {:?}", path));
        }

        let mut asset = VideoAsset {
            path: path.to_path_buf(),
            duration_secs: None,
            title: None,
            streams: None,
        };

        match probe_metadata(path).await {
            Ok((duration, title, streams)) => {
                asset.duration_secs = duration;
                asset.title = title;
                asset.streams = Some(streams);
            }
            Err(e) => {
                warn!("Media probe failed for {:?}: {}", path, e);
            }
        }

        Ok(asset)
    }

    /// Path of the underlying media file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Container duration in seconds, when the probe could read it
    pub fn duration_secs(&self) -> Option<f64> {
        self.duration_secs
    }

    /// Title tag from the container metadata
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Subtitle entries of the stream table
    ///
    /// Errors when the stream table itself was unreadable, which is distinct
    /// from a readable table with no subtitle streams.
    pub fn subtitle_streams(&self) -> Result<Vec<&StreamInfo>, MediaError> {
        match &self.streams {
            Some(streams) => Ok(streams
                .iter()
                .filter(|s| s.codec_type == "subtitle")
                .collect()),
            None => Err(MediaError::StreamTableUnreadable {
                path: self.path.clone(),
                message: "media probe did not produce a stream table".to_string(),
            }),
        }
    }
}

/// Run ffprobe against the file and pull out duration, title and streams
async fn probe_metadata(path: &Path) -> Result<(Option<f64>, Option<String>, Vec<StreamInfo>), MediaError> {
    let output = run_tool(
        "ffprobe",
        &[
            "-v", "quiet",
            "-print_format", "json",
            "-show_format",
            "-show_streams",
            path.to_str().unwrap_or_default(),
        ],
        FFPROBE_TIMEOUT_SECS,
    )
    .await?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: Value = serde_json::from_str(&stdout).map_err(|e| MediaError::ParseOutput {
        tool: "ffprobe",
        message: e.to_string(),
    })?;

    let duration = json
        .get("format")
        .and_then(|f| f.get("duration"))
        .and_then(|d| d.as_str())
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| *d > 0.0);

    let title = json
        .get("format")
        .and_then(|f| f.get("tags"))
        .and_then(|t| t.get("title"))
        .and_then(|t| t.as_str())
        .map(|t| t.to_string())
        .filter(|t| !t.trim().is_empty());

    let mut streams = Vec::new();
    if let Some(entries) = json.get("streams").and_then(|s| s.as_array()) {
        for stream in entries {
            let index = stream.get("index")
                .and_then(|v| v.as_u64())
                .map(|v| v as usize)
                .unwrap_or(0);

            let codec_type = stream.get("codec_type")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");

            let codec_name = stream.get("codec_name")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");

            let language = stream.get("tags")
                .and_then(|t| t.get("language"))
                .and_then(|l| l.as_str())
                .map(|s| s.to_string());

            streams.push(StreamInfo {
                index,
                codec_type: codec_type.to_string(),
                codec_name: codec_name.to_string(),
                language,
            });
        }
    }

    debug!("Probed {:?}: duration={:?}, {} streams", path, duration, streams.len());

    Ok((duration, title, streams))
}

impl VideoAsset {
    /// Create an asset with pre-supplied metadata, bypassing the probe.
    /// Used by tests that exercise the tiers without media tooling installed.
    pub fn new_for_test(path: PathBuf, duration_secs: Option<f64>) -> Self {
        VideoAsset {
            path,
            duration_secs,
            title: None,
            streams: None,
        }
    }
}

/// Capability interface for single-frame capture
///
/// The optical tier is written against this seam; production uses the
/// ffmpeg-backed implementation below.
#[async_trait::async_trait]
pub trait FrameGrabber: Send + Sync {
    /// Capture exactly one frame at the given timestamp into an image file
    async fn capture(&self, asset: &VideoAsset, at_secs: f64, output: &Path) -> Result<(), MediaError>;
}

/// Frame capture through ffmpeg
#[derive(Debug, Default)]
pub struct FfmpegFrameGrabber;

#[async_trait::async_trait]
impl FrameGrabber for FfmpegFrameGrabber {
    async fn capture(&self, asset: &VideoAsset, at_secs: f64, output: &Path) -> Result<(), MediaError> {
        capture_frame(asset, at_secs, output).await
    }
}

/// Extract one subtitle stream losslessly into an SRT file
pub async fn extract_subtitle_stream(asset: &VideoAsset, stream_index: usize, output: &Path) -> Result<(), MediaError> {
    run_tool(
        "ffmpeg",
        &[
            "-y",
            "-i", asset.path().to_str().unwrap_or_default(),
            "-map", &format!("0:{}", stream_index),
            "-c:s", "srt",
            output.to_str().unwrap_or_default(),
        ],
        FFMPEG_TIMEOUT_SECS,
    )
    .await?;
    Ok(())
}

/// Capture exactly one frame at the given timestamp into an image file
pub async fn capture_frame(asset: &VideoAsset, at_secs: f64, output: &Path) -> Result<(), MediaError> {
    // Seeking before the input keeps the capture fast on long videos
    run_tool(
        "ffmpeg",
        &[
            "-y",
            "-ss", &format_timestamp_secs(at_secs).replace(',', "."),
            "-i", asset.path().to_str().unwrap_or_default(),
            "-frames:v", "1",
            "-q:v", "2",
            output.to_str().unwrap_or_default(),
        ],
        FFMPEG_TIMEOUT_SECS,
    )
    .await?;
    Ok(())
}

/// Demux the audio track to mono 16 kHz PCM WAV for the transcription backends
pub async fn demux_audio(asset: &VideoAsset, output: &Path) -> Result<(), MediaError> {
    run_tool(
        "ffmpeg",
        &[
            "-y",
            "-i", asset.path().to_str().unwrap_or_default(),
            "-vn",
            "-ac", "1",
            "-ar", "16000",
            "-c:a", "pcm_s16le",
            output.to_str().unwrap_or_default(),
        ],
        FFMPEG_TIMEOUT_SECS,
    )
    .await?;
    Ok(())
}

/// Run an external tool with a time budget and a checked exit status
async fn run_tool(tool: &'static str, args: &[&str], timeout_secs: u64) -> Result<std::process::Output, MediaError> {
    let future = Command::new(tool).args(args).output();

    let output = tokio::select! {
        result = future => {
            result.map_err(|e| MediaError::Spawn { tool, message: e.to_string() })?
        },
        _ = tokio::time::sleep(Duration::from_secs(timeout_secs)) => {
            return Err(MediaError::Timeout { tool, seconds: timeout_secs });
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MediaError::CommandFailed {
            tool,
            stderr: filter_tool_stderr(&stderr),
        });
    }

    Ok(output)
}

/// Filter ffmpeg stderr to only show meaningful error lines, stripping the
/// version banner, build configuration, and stream metadata noise.
fn filter_tool_stderr(stderr: &str) -> String {
    let dominated_prefixes = [
        "ffmpeg version",
        "ffprobe version",
        "  built with",
        "  configuration:",
        "  lib",
        "Input #",
        "  Metadata:",
        "  Duration:",
        "  Chapter",
        "    Chapter",
        "  Stream #",
        "      Metadata:",
        "        title",
        "        BPS",
        "        DURATION",
        "        NUMBER_OF",
        "        _STATISTICS",
        "Output #",
        "Stream mapping:",
        "Press [q]",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return false;
            }
            !dominated_prefixes.iter().any(|p| line.starts_with(p))
        })
        .collect();

    if meaningful.is_empty() {
        "unknown error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}

/// Probe a command-line collaborator and report its first version line
///
/// Used by the startup environment report; a missing binary is an `Err`, not
/// a panic.
pub async fn probe_tool_version(bin: &str, version_arg: &str) -> Result<String> {
    let future = Command::new(bin).arg(version_arg).output();

    let output = tokio::select! {
        result = future => result?,
        _ = tokio::time::sleep(Duration::from_secs(10)) => {
            return Err(anyhow!("{} timed out while reporting its version", bin));
        }
    };

    let text = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).to_string()
    } else {
        String::from_utf8_lossy(&output.stdout).to_string()
    };

    Ok(text.lines().next().unwrap_or("").trim().to_string())
}
