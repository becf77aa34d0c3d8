/*!
 * Quality assessment for machine-transcribed subtitle tracks.
 *
 * Computes statistical signals over a primary-ASR track and renders a
 * deterministic pass/fail verdict. Embedded and optical tracks are trusted
 * sources and never pass through here.
 */

use std::collections::HashSet;

use crate::app_config::QualityThresholds;
use crate::subtitle_processor::SubtitleTrack;

/// Pass/fail verdict of the quality gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityVerdict {
    /// Track accepted
    Pass,
    /// Track rejected; the report's reasons say why
    Fail,
}

/// Statistical report over one machine-transcribed track
#[derive(Debug, Clone)]
pub struct QualityReport {
    /// Number of cues
    pub count: usize,

    /// Mean character length of trimmed cue text
    pub avg_length: f64,

    /// Share of duplicated non-trivial texts (1 - unique/total)
    pub repetition_rate: f64,

    /// Longest run of adjacent cues with identical non-trivial text
    pub max_consecutive_same: usize,

    /// Fraction of cues whose trimmed text is shorter than 2 characters
    pub empty_fraction: f64,

    /// The verdict
    pub verdict: QualityVerdict,

    /// One human-readable explanation per violated threshold
    pub reasons: Vec<String>,
}

impl QualityReport {
    /// True when the track passed the gate
    pub fn passed(&self) -> bool {
        self.verdict == QualityVerdict::Pass
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "{} cues, avg length {:.1}, repetition {:.0}%, longest run {}, empty {:.0}%",
            self.count,
            self.avg_length,
            self.repetition_rate * 100.0,
            self.max_consecutive_same,
            self.empty_fraction * 100.0
        )
    }
}

/// Quality assessor with configurable thresholds
///
/// The thresholds are tunable defaults; the verdict is a pure function of
/// the track and the thresholds.
#[derive(Debug, Clone, Default)]
pub struct QualityAssessor {
    thresholds: QualityThresholds,
}

impl QualityAssessor {
    /// Create an assessor with default thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an assessor with custom thresholds
    pub fn with_thresholds(thresholds: QualityThresholds) -> Self {
        Self { thresholds }
    }

    /// Thresholds in effect
    pub fn thresholds(&self) -> &QualityThresholds {
        &self.thresholds
    }

    /// Assess one track and render the verdict
    pub fn assess(&self, track: &SubtitleTrack) -> QualityReport {
        let count = track.len();

        let trimmed: Vec<&str> = track.cues.iter().map(|cue| cue.text.trim()).collect();

        let avg_length = if count > 0 {
            let total: usize = trimmed.iter().map(|t| t.chars().count()).sum();
            total as f64 / count as f64
        } else {
            0.0
        };

        let empty_count = trimmed.iter().filter(|t| t.chars().count() < 2).count();
        let empty_fraction = if count > 0 {
            empty_count as f64 / count as f64
        } else {
            0.0
        };

        // Repetition over non-trivial texts only, so runs of filler cues do
        // not mask a genuinely stuck recognizer
        let non_trivial: Vec<&str> = trimmed
            .iter()
            .copied()
            .filter(|t| t.chars().count() > 1)
            .collect();
        let repetition_rate = if non_trivial.is_empty() {
            0.0
        } else {
            let unique: HashSet<&str> = non_trivial.iter().copied().collect();
            1.0 - unique.len() as f64 / non_trivial.len() as f64
        };

        let mut max_consecutive_same = if count > 0 { 1 } else { 0 };
        let mut current_run = 1;
        for i in 1..trimmed.len() {
            if trimmed[i] == trimmed[i - 1] && trimmed[i].chars().count() > 1 {
                current_run += 1;
                max_consecutive_same = max_consecutive_same.max(current_run);
            } else {
                current_run = 1;
            }
        }

        let mut reasons = Vec::new();

        if count < self.thresholds.min_count {
            reasons.push(format!(
                "cue count too low ({} < {})",
                count, self.thresholds.min_count
            ));
        }

        if repetition_rate > self.thresholds.max_repetition_rate {
            reasons.push(format!(
                "repetition rate too high ({:.1}% > {:.1}%)",
                repetition_rate * 100.0,
                self.thresholds.max_repetition_rate * 100.0
            ));
        }

        if max_consecutive_same > self.thresholds.max_consecutive_same {
            reasons.push(format!(
                "too many consecutive identical cues ({} > {})",
                max_consecutive_same, self.thresholds.max_consecutive_same
            ));
        }

        if avg_length < self.thresholds.min_avg_length {
            reasons.push(format!(
                "average cue length too short ({:.1} < {:.1})",
                avg_length, self.thresholds.min_avg_length
            ));
        }

        if empty_fraction > self.thresholds.max_empty_fraction {
            reasons.push(format!(
                "too many empty cues ({}/{})",
                empty_count, count
            ));
        }

        let verdict = if reasons.is_empty() {
            QualityVerdict::Pass
        } else {
            QualityVerdict::Fail
        };

        QualityReport {
            count,
            avg_length,
            repetition_rate,
            max_consecutive_same,
            empty_fraction,
            verdict,
            reasons,
        }
    }
}
