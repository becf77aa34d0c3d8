use std::fs;
use std::fs::File;
use std::fmt;
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Result, Context, anyhow};
use std::io::Write;
use std::path::Path;
use log::warn;

// @module: Subtitle cue model and SRT serialization

// @const: SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}):(\d{2}):(\d{2}),(\d{3}) --> (\d{2}):(\d{2}):(\d{2}),(\d{3})").unwrap()
});

/// Which tier produced a subtitle track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSource {
    /// Pre-existing text stream extracted from the container
    Embedded,
    /// Burned-in captions recovered by optical recognition
    Ocr,
    /// Primary speech-recognition backend
    AsrPrimary,
    /// Fallback speech-recognition backend
    AsrFallback,
}

impl TrackSource {
    // @returns: Stable identifier used in logs and the final report
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Embedded => "embedded",
            Self::Ocr => "ocr",
            Self::AsrPrimary => "asr-primary",
            Self::AsrFallback => "asr-fallback",
        }
    }

    /// True when the track came from a machine transcription backend
    pub fn is_machine_transcription(&self) -> bool {
        matches!(self, Self::AsrPrimary | Self::AsrFallback)
    }
}

impl fmt::Display for TrackSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// @struct: Single subtitle cue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleCue {
    // @field: Sequence number, 1-based and dense in final output order
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Cue text
    pub text: String,
}

impl SubtitleCue {
    /// Creates a new cue without validation - machine tiers may retain empty
    /// placeholder text, which the quality assessor counts
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        SubtitleCue {
            seq_num,
            start_time_ms,
            end_time_ms,
            text,
        }
    }

    // @creates: Validated cue
    // @validates: Time range and non-empty text
    pub fn new_validated(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Result<Self> {
        if end_time_ms <= start_time_ms {
            return Err(anyhow!(
                "Invalid time range: end time {} <= start time {}",
                end_time_ms, start_time_ms
            ));
        }

        let trimmed_text = text.trim();
        if trimmed_text.is_empty() {
            return Err(anyhow!("Empty cue text for entry {}", seq_num));
        }

        Ok(SubtitleCue {
            seq_num,
            start_time_ms,
            end_time_ms,
            text: trimmed_text.to_string(),
        })
    }

    /// Build a cue from fractional-second timestamps, truncating to milliseconds
    pub fn from_seconds(seq_num: usize, start_secs: f64, end_secs: f64, text: String) -> Self {
        Self::new(seq_num, secs_to_ms(start_secs), secs_to_ms(end_secs), text)
    }

    /// Parse an SRT timestamp to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64> {
        // Parse HH:MM:SS,mmm format
        let parts: Vec<&str> = timestamp.split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(anyhow!("Invalid timestamp format: {}", timestamp));
        }

        let hours: u64 = parts[0].parse().context("Failed to parse hours")?;
        let minutes: u64 = parts[1].parse().context("Failed to parse minutes")?;
        let seconds: u64 = parts[2].parse().context("Failed to parse seconds")?;
        let millis: u64 = parts[3].parse().context("Failed to parse milliseconds")?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
        }

        Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time_ms)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time_ms)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }

    /// Character length of the trimmed cue text
    pub fn trimmed_len(&self) -> usize {
        self.text.trim().chars().count()
    }
}

/// Convert fractional seconds to milliseconds by truncation
fn secs_to_ms(seconds: f64) -> u64 {
    (seconds.max(0.0) * 1000.0) as u64
}

/// Format a fractional-second timestamp to SRT format (HH:MM:SS,mmm)
///
/// Hours, minutes and seconds are floored; the fractional second is
/// truncated to millisecond precision.
pub fn format_timestamp_secs(seconds: f64) -> String {
    SubtitleCue::format_timestamp(secs_to_ms(seconds))
}

impl fmt::Display for SubtitleCue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Ordered cue sequence tagged with the tier that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleTrack {
    /// Tier that produced the track
    pub source: TrackSource,

    /// Cues, sorted ascending by start time
    pub cues: Vec<SubtitleCue>,
}

impl SubtitleTrack {
    /// Create an empty track for the given source
    pub fn new(source: TrackSource) -> Self {
        SubtitleTrack {
            source,
            cues: Vec::new(),
        }
    }

    /// Build a track from cues, restoring the ordering invariants:
    /// cues sorted ascending by start, indices dense and 1-based
    pub fn from_cues(source: TrackSource, mut cues: Vec<SubtitleCue>) -> Self {
        cues.sort_by_key(|cue| cue.start_time_ms);
        for (i, cue) in cues.iter_mut().enumerate() {
            cue.seq_num = i + 1;
        }
        SubtitleTrack { source, cues }
    }

    /// Number of cues in the track
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// True when the track holds no cues
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Serialize the track to the canonical SRT text representation
    pub fn to_srt_string(&self) -> String {
        let mut out = String::new();
        for cue in &self.cues {
            // Display renders one full SRT block per cue
            out.push_str(&cue.to_string());
        }
        out
    }

    /// Write the track to an SRT file
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut file = File::create(path)
            .with_context(|| format!("Failed to create subtitle file: {}", path.display()))?;

        for cue in &self.cues {
            write!(file, "{}", cue)?;
        }

        Ok(())
    }

    /// Parse an SRT file into a track tagged with the given source
    pub fn parse_srt_file<P: AsRef<Path>>(source: TrackSource, path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read subtitle file: {}", path.as_ref().display()))?;
        Self::parse_srt_string(source, &content)
    }

    /// Parse SRT format text into a track tagged with the given source
    ///
    /// Malformed entries are skipped with a warning. Surviving cues are
    /// sorted by start time and renumbered so the track invariants hold.
    pub fn parse_srt_string(source: TrackSource, content: &str) -> Result<Self> {
        let mut cues = Vec::new();

        // State variables for parsing
        let mut current_seq_num: Option<usize> = None;
        let mut current_start_time_ms: Option<u64> = None;
        let mut current_end_time_ms: Option<u64> = None;
        let mut current_text = String::new();
        let mut line_count = 0;

        let mut add_current_cue = |seq_num: usize, start_ms: u64, end_ms: u64, text: &str| {
            match SubtitleCue::new_validated(seq_num, start_ms, end_ms, text.trim().to_string()) {
                Ok(cue) => cues.push(cue),
                Err(e) => warn!("Skipping invalid subtitle entry {}: {}", seq_num, e),
            }
        };

        for line in content.lines() {
            line_count += 1;
            let trimmed = line.trim();

            // An empty line finalizes the in-flight cue
            if trimmed.is_empty() {
                if let (Some(seq_num), Some(start_ms), Some(end_ms)) = (current_seq_num, current_start_time_ms, current_end_time_ms) {
                    if !current_text.is_empty() {
                        add_current_cue(seq_num, start_ms, end_ms, &current_text);

                        current_seq_num = None;
                        current_start_time_ms = None;
                        current_end_time_ms = None;
                        current_text.clear();
                    }
                }
                continue;
            }

            // Try to parse as sequence number (only when starting a new cue)
            if current_seq_num.is_none() && current_text.is_empty() {
                if let Ok(num) = trimmed.parse::<usize>() {
                    current_seq_num = Some(num);
                    continue;
                }
            }

            // Try to parse as timestamp line
            if current_seq_num.is_some() && current_start_time_ms.is_none() && current_end_time_ms.is_none() {
                if let Some(caps) = TIMESTAMP_REGEX.captures(trimmed) {
                    match (Self::parse_timestamp_to_ms(&caps, 1), Self::parse_timestamp_to_ms(&caps, 5)) {
                        (Ok(start_ms), Ok(end_ms)) => {
                            current_start_time_ms = Some(start_ms);
                            current_end_time_ms = Some(end_ms);
                            continue;
                        },
                        _ => {
                            warn!("Invalid timestamp format at line {}: {}", line_count, trimmed);
                        }
                    }
                }
            }

            // With sequence number and timestamps in hand, this must be cue text
            if current_seq_num.is_some() && current_start_time_ms.is_some() && current_end_time_ms.is_some() {
                if !current_text.is_empty() {
                    current_text.push('\n');
                }
                current_text.push_str(trimmed);
            } else {
                warn!("Unexpected text at line {} before sequence number or timestamp: {}", line_count, trimmed);
            }
        }

        // Flush the last cue if there is one
        if let (Some(seq_num), Some(start_ms), Some(end_ms)) = (current_seq_num, current_start_time_ms, current_end_time_ms) {
            if !current_text.is_empty() {
                add_current_cue(seq_num, start_ms, end_ms, &current_text);
            }
        }

        if cues.is_empty() {
            return Err(anyhow!("No valid subtitle entries were found in the SRT content"));
        }

        Ok(Self::from_cues(source, cues))
    }

    /// Parse timestamp captures to milliseconds
    fn parse_timestamp_to_ms(caps: &regex::Captures, start_idx: usize) -> Result<u64> {
        let hours: u64 = caps.get(start_idx)
            .map_or(0, |m| m.as_str().parse().unwrap_or(0));
        let minutes: u64 = caps.get(start_idx + 1)
            .map_or(0, |m| m.as_str().parse().unwrap_or(0));
        let seconds: u64 = caps.get(start_idx + 2)
            .map_or(0, |m| m.as_str().parse().unwrap_or(0));
        let millis: u64 = caps.get(start_idx + 3)
            .map_or(0, |m| m.as_str().parse().unwrap_or(0));

        Ok((hours * 3600 + minutes * 60 + seconds) * 1000 + millis)
    }
}

impl fmt::Display for SubtitleTrack {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle track ({})", self.source)?;
        writeln!(f, "Cues: {}", self.cues.len())?;
        Ok(())
    }
}
