/*!
 * Tests for the quality assessor
 */

use subtier::app_config::QualityThresholds;
use subtier::extraction::quality::{QualityAssessor, QualityVerdict};
use subtier::subtitle_processor::TrackSource;
use crate::common;

fn assess(texts: &[&str]) -> subtier::QualityReport {
    QualityAssessor::new().assess(&common::track_from_texts(TrackSource::AsrPrimary, texts))
}

/// Test that a plausible transcript passes with no reasons
#[test]
fn test_assess_withHealthyTranscript_shouldPass() {
    let report = QualityAssessor::new().assess(&common::healthy_track(TrackSource::AsrPrimary, 25));

    assert_eq!(report.verdict, QualityVerdict::Pass);
    assert!(report.reasons.is_empty());
    assert_eq!(report.count, 25);
    assert!(report.avg_length >= 2.0);
}

/// Test gate monotonicity: a high repetition rate fails regardless of the
/// other metrics
#[test]
fn test_assess_withHighRepetition_shouldAlwaysFail() {
    // 20 cues of healthy length, but only 4 distinct texts among 20:
    // repetition rate 0.8
    let texts: Vec<String> = (0..20).map(|i| format!("Repeated phrase {}", i % 4)).collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();

    let report = assess(&refs);

    assert!((report.repetition_rate - 0.8).abs() < 1e-9);
    assert_eq!(report.verdict, QualityVerdict::Fail);
    assert!(report.reasons.iter().any(|r| r.contains("repetition")));
}

/// Test gate monotonicity: a low cue count fails regardless of the other
/// metrics
#[test]
fn test_assess_withFiveCues_shouldAlwaysFail() {
    let report = assess(&[
        "A perfectly good line",
        "Another perfectly good line",
        "Yet another one",
        "Still fine on its own",
        "Five distinct healthy cues",
    ]);

    assert_eq!(report.count, 5);
    assert_eq!(report.verdict, QualityVerdict::Fail);
    assert!(report.reasons.iter().any(|r| r.contains("count")));
}

/// Test the consecutive-run metric and its threshold
#[test]
fn test_assess_withLongIdenticalRun_shouldFailOnRun() {
    let mut refs = vec!["stuck output"; 12];
    // Pad with distinct lines so count and repetition are not the trigger
    let tail: Vec<String> = (0..30).map(|i| format!("Distinct trailing line {}", i)).collect();
    refs.extend(tail.iter().map(String::as_str));

    let report = assess(&refs);

    assert_eq!(report.max_consecutive_same, 12);
    assert!(report.reasons.iter().any(|r| r.contains("consecutive")));
    assert_eq!(report.verdict, QualityVerdict::Fail);
}

/// Test the average-length and empty-fraction metrics
#[test]
fn test_assess_withDegenerateTexts_shouldFailOnLengthSignals() {
    let texts: Vec<&str> = std::iter::repeat("x").take(15).collect();

    let report = assess(&texts);

    assert!(report.avg_length < 2.0);
    assert!(report.empty_fraction > 0.5);
    assert_eq!(report.verdict, QualityVerdict::Fail);
    assert!(report.reasons.iter().any(|r| r.contains("length")));
    assert!(report.reasons.iter().any(|r| r.contains("empty")));
}

/// Test that the verdict is deterministic
#[test]
fn test_assess_shouldBeDeterministic() {
    let track = common::healthy_track(TrackSource::AsrPrimary, 15);
    let assessor = QualityAssessor::new();

    let first = assessor.assess(&track);
    let second = assessor.assess(&track);

    assert_eq!(first.verdict, second.verdict);
    assert_eq!(first.reasons, second.reasons);
    assert_eq!(first.count, second.count);
}

/// Test that thresholds are tunable, not hard-coded
#[test]
fn test_assess_withCustomThresholds_shouldChangeVerdict() {
    let track = common::healthy_track(TrackSource::AsrPrimary, 5);

    let default_report = QualityAssessor::new().assess(&track);
    assert_eq!(default_report.verdict, QualityVerdict::Fail);

    let lenient = QualityAssessor::with_thresholds(QualityThresholds {
        min_count: 3,
        ..QualityThresholds::default()
    });
    let lenient_report = lenient.assess(&track);
    assert_eq!(lenient_report.verdict, QualityVerdict::Pass);
}

/// Test that trivially short texts do not count toward repetition
#[test]
fn test_assess_repetitionRate_shouldIgnoreTrivialTexts() {
    // The single-char cues repeat, but only non-trivial texts are counted
    let report = assess(&["-", "-", "-", "Real line one", "Real line two"]);

    assert!((report.repetition_rate - 0.0).abs() < 1e-9);
}
