/*!
 * Integration tests for the extraction pipeline
 *
 * The routing scenarios drive the orchestrator with scripted tiers; the
 * optical scenario drives the real optical tier with a scripted recognizer.
 * None of these tests require media tooling on the machine.
 */

use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::Result;

use subtier::app_config::{OpticalConfig, QualityThresholds};
use subtier::extraction::optical::OpticalTier;
use subtier::extraction::orchestrator::Orchestrator;
use subtier::extraction::quality::QualityAssessor;
use subtier::extraction::{AttemptDisposition, SubtitleTier, Tier, TierOutcome};
use subtier::engines::mock::MockRecognizer;
use subtier::media::VideoAsset;
use subtier::subtitle_processor::TrackSource;

use crate::common;
use crate::common::mock_tiers::{MockTier, MockTierScript, NoopFrameGrabber};

fn test_asset() -> VideoAsset {
    VideoAsset::new_for_test("test.mp4".into(), Some(600.0))
}

fn orchestrator_with(
    embedded: MockTier,
    optical: MockTier,
    primary: MockTier,
    fallback: MockTier,
) -> Orchestrator {
    Orchestrator::new(
        Box::new(embedded),
        Box::new(optical),
        Box::new(primary),
        Box::new(fallback),
        QualityAssessor::new(),
        0,
    )
}

/// Scenario A: an embedded stream exists, so nothing more expensive runs
#[tokio::test]
async fn test_pipeline_withEmbeddedStream_shouldStopAtFirstTier() {
    let embedded = MockTier::new(
        Tier::Embedded,
        MockTierScript::Succeed(common::healthy_track(TrackSource::Embedded, 12)),
    );
    let optical = MockTier::new(Tier::Optical, MockTierScript::Fail("should not run"));
    let primary = MockTier::new(Tier::AsrPrimary, MockTierScript::Fail("should not run"));
    let fallback = MockTier::new(Tier::AsrFallback, MockTierScript::Fail("should not run"));

    let optical_calls = optical.counter();
    let primary_calls = primary.counter();
    let fallback_calls = fallback.counter();

    let outcome = orchestrator_with(embedded, optical, primary, fallback)
        .run(&test_asset())
        .await
        .unwrap();

    assert_eq!(outcome.mode, TrackSource::Embedded);
    assert_eq!(optical_calls.load(Ordering::SeqCst), 0);
    assert_eq!(primary_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
    assert_eq!(outcome.attempts.len(), 1);
    assert_eq!(outcome.attempts[0].disposition, AttemptDisposition::Accepted);
}

/// Scenario B: no embedded stream, burned captions found by the detector
#[tokio::test]
async fn test_pipeline_withBurnedCaptions_shouldReturnOcrMode() {
    let embedded = MockTier::new(Tier::Embedded, MockTierScript::Unavailable("no subtitle stream"));
    let optical = MockTier::new(
        Tier::Optical,
        MockTierScript::Succeed(common::healthy_track(TrackSource::Ocr, 20)),
    );
    let primary = MockTier::new(Tier::AsrPrimary, MockTierScript::Fail("should not run"));
    let fallback = MockTier::new(Tier::AsrFallback, MockTierScript::Fail("should not run"));

    let primary_calls = primary.counter();
    let fallback_calls = fallback.counter();

    let outcome = orchestrator_with(embedded, optical, primary, fallback)
        .run(&test_asset())
        .await
        .unwrap();

    assert_eq!(outcome.mode, TrackSource::Ocr);
    assert_eq!(primary_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
}

/// Scenario B, detector level: a positive match only at the third sampled
/// timestamp still triggers full-duration extraction
#[tokio::test]
async fn test_optical_tier_withThirdSamplePositive_shouldExtractFullDuration() {
    // Detection samples 60s/180s/300s: blank, blank, hit. The extraction
    // grid then consumes the rest of the script.
    let mut script: Vec<Option<String>> = vec![
        Some(String::new()),
        Some(String::new()),
        Some("burned caption".to_string()),
    ];
    // 600s duration at 100s intervals -> 6 extraction samples
    script.extend([
        Some("caption one".to_string()),
        Some(String::new()),
        Some("caption two".to_string()),
        Some("caption two".to_string()),
        Some(String::new()),
        Some("caption three".to_string()),
    ]);
    let recognizer = MockRecognizer::scripted(script);

    let config = OpticalConfig {
        sample_offsets_secs: vec![60.0, 180.0, 300.0],
        extraction_interval_secs: 100.0,
        concurrency: 1,
    };
    let tier = OpticalTier::with_frame_grabber(
        Arc::new(recognizer.clone()),
        Arc::new(NoopFrameGrabber),
        config,
    );

    let outcome = tier.attempt(&test_asset()).await;

    let TierOutcome::Succeeded(track) = outcome else {
        panic!("expected a produced track");
    };

    assert_eq!(track.source, TrackSource::Ocr);
    // Four non-empty recognitions; the repeated caption is kept as two cues
    assert_eq!(track.len(), 4);
    assert_eq!(track.cues[1].text, "caption two");
    assert_eq!(track.cues[2].text, "caption two");
    // 3 detection samples + 6 extraction samples
    assert_eq!(recognizer.calls(), 9);

    // Cues are in temporal order with the nominal per-interval duration
    assert_eq!(track.cues[0].start_time_ms, 0);
    assert_eq!(track.cues[0].end_time_ms, 100_000);
    for pair in track.cues.windows(2) {
        assert!(pair[0].start_time_ms < pair[1].start_time_ms);
    }
}

/// Detector level: no text at any sample routes onward without extraction
#[tokio::test]
async fn test_optical_tier_withNoTextAnywhere_shouldReportUnavailable() {
    let recognizer = MockRecognizer::blank();
    let config = OpticalConfig {
        sample_offsets_secs: vec![60.0, 180.0, 300.0],
        extraction_interval_secs: 100.0,
        concurrency: 1,
    };
    let tier = OpticalTier::with_frame_grabber(
        Arc::new(recognizer.clone()),
        Arc::new(NoopFrameGrabber),
        config,
    );

    let outcome = tier.attempt(&test_asset()).await;

    assert!(matches!(outcome, TierOutcome::Unavailable(_)));
    // Only the detection samples ran
    assert_eq!(recognizer.calls(), 3);
}

/// Detector level: an unavailable recognizer skips the tier without sampling
#[tokio::test]
async fn test_optical_tier_withMissingEngine_shouldSkipWithoutSampling() {
    let recognizer = MockRecognizer::unavailable();
    let tier = OpticalTier::with_frame_grabber(
        Arc::new(recognizer.clone()),
        Arc::new(NoopFrameGrabber),
        OpticalConfig::default(),
    );

    let outcome = tier.attempt(&test_asset()).await;

    assert!(matches!(outcome, TierOutcome::Unavailable(_)));
    assert_eq!(recognizer.calls(), 0);
}

/// Scenario C: primary transcript rejected by the gate, fallback accepted
#[tokio::test]
async fn test_pipeline_withLowQualityPrimary_shouldFallBack() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let output_path = temp_dir.path().join("out.srt");

    let embedded = MockTier::new(Tier::Embedded, MockTierScript::Unavailable("no subtitle stream"));
    let optical = MockTier::new(Tier::Optical, MockTierScript::Unavailable("no burned captions"));
    // Five cues: below the count threshold
    let primary = MockTier::new(
        Tier::AsrPrimary,
        MockTierScript::Succeed(common::healthy_track(TrackSource::AsrPrimary, 5)),
    );
    let fallback = MockTier::new(
        Tier::AsrFallback,
        MockTierScript::Succeed(common::healthy_track(TrackSource::AsrFallback, 30)),
    );

    let fallback_calls = fallback.counter();

    let outcome = orchestrator_with(embedded, optical, primary, fallback)
        .run(&test_asset())
        .await
        .unwrap();

    assert_eq!(outcome.mode, TrackSource::AsrFallback);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);

    // The rejected attempt carries the count reason
    let rejected = outcome
        .attempts
        .iter()
        .find(|a| a.disposition == AttemptDisposition::Rejected)
        .expect("primary attempt should be recorded as rejected");
    assert_eq!(rejected.tier, Tier::AsrPrimary);
    assert!(rejected.reason.contains("count"));

    // No partial artifact was ever written
    assert!(!output_path.exists());
    Ok(())
}

/// Gate pass: an accepted primary transcript carries its quality report
#[tokio::test]
async fn test_pipeline_withHealthyPrimary_shouldPassGate() {
    let embedded = MockTier::new(Tier::Embedded, MockTierScript::Unavailable("no subtitle stream"));
    let optical = MockTier::new(Tier::Optical, MockTierScript::Unavailable("no burned captions"));
    let primary = MockTier::new(
        Tier::AsrPrimary,
        MockTierScript::Succeed(common::healthy_track(TrackSource::AsrPrimary, 40)),
    );
    let fallback = MockTier::new(Tier::AsrFallback, MockTierScript::Fail("should not run"));

    let fallback_calls = fallback.counter();

    let outcome = orchestrator_with(embedded, optical, primary, fallback)
        .run(&test_asset())
        .await
        .unwrap();

    assert_eq!(outcome.mode, TrackSource::AsrPrimary);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);

    let report = outcome.quality.expect("gated mode should carry a report");
    assert!(report.passed());
    assert_eq!(report.count, 40);
}

/// A primary backend crash skips the gate and goes straight to fallback
#[tokio::test]
async fn test_pipeline_withPrimaryCrash_shouldSkipGate() {
    let embedded = MockTier::new(Tier::Embedded, MockTierScript::Unavailable("no subtitle stream"));
    let optical = MockTier::new(Tier::Optical, MockTierScript::Unavailable("no burned captions"));
    let primary = MockTier::new(Tier::AsrPrimary, MockTierScript::Fail("engine exploded"));
    let fallback = MockTier::new(
        Tier::AsrFallback,
        MockTierScript::Succeed(common::healthy_track(TrackSource::AsrFallback, 15)),
    );

    let outcome = orchestrator_with(embedded, optical, primary, fallback)
        .run(&test_asset())
        .await
        .unwrap();

    assert_eq!(outcome.mode, TrackSource::AsrFallback);
    // No gate ran, so no quality report
    assert!(outcome.quality.is_none());
    assert!(outcome
        .attempts
        .iter()
        .any(|a| a.tier == Tier::AsrPrimary && a.disposition == AttemptDisposition::Failed));
}

/// Scenario D: every tier exhausted
#[tokio::test]
async fn test_pipeline_withEverythingBroken_shouldExhaustAllTiers() {
    let embedded = MockTier::new(Tier::Embedded, MockTierScript::Unavailable("no subtitle stream"));
    let optical = MockTier::new(Tier::Optical, MockTierScript::Unavailable("no burned captions"));
    let primary = MockTier::new(Tier::AsrPrimary, MockTierScript::Fail("primary exploded"));
    let fallback = MockTier::new(Tier::AsrFallback, MockTierScript::Fail("fallback exploded"));

    let counters = [
        embedded.counter(),
        optical.counter(),
        primary.counter(),
        fallback.counter(),
    ];

    let error = orchestrator_with(embedded, optical, primary, fallback)
        .run(&test_asset())
        .await
        .unwrap_err();

    // Every tier was attempted exactly once
    for counter in &counters {
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    // The terminal error enumerates every attempted tier with its reason
    assert_eq!(error.attempts.len(), 4);
    let tiers: Vec<Tier> = error.attempts.iter().map(|a| a.tier).collect();
    assert_eq!(
        tiers,
        vec![Tier::Embedded, Tier::Optical, Tier::AsrPrimary, Tier::AsrFallback]
    );

    let rendered = error.to_string();
    assert!(rendered.contains("all tiers exhausted"));
    assert!(rendered.contains("primary exploded"));
    assert!(rendered.contains("fallback exploded"));
}

/// A tier that overruns its time budget counts as failed, and the run moves on
#[tokio::test]
async fn test_pipeline_withSlowTier_shouldTimeOutAndFallThrough() {
    let embedded = MockTier::new(Tier::Embedded, MockTierScript::Unavailable("no subtitle stream"));
    let optical = MockTier::new(Tier::Optical, MockTierScript::Unavailable("no burned captions"));
    // Sleeps far past the 1s budget
    let primary = MockTier::new(
        Tier::AsrPrimary,
        MockTierScript::SucceedAfter(30_000, common::healthy_track(TrackSource::AsrPrimary, 40)),
    );
    let fallback = MockTier::new(
        Tier::AsrFallback,
        MockTierScript::Succeed(common::healthy_track(TrackSource::AsrFallback, 15)),
    );

    let orchestrator = Orchestrator::new(
        Box::new(embedded),
        Box::new(optical),
        Box::new(primary),
        Box::new(fallback),
        QualityAssessor::new(),
        1,
    );

    let start = std::time::Instant::now();
    let outcome = orchestrator.run(&test_asset()).await.unwrap();

    assert_eq!(outcome.mode, TrackSource::AsrFallback);
    assert!(start.elapsed() < std::time::Duration::from_secs(10));
    assert!(outcome
        .attempts
        .iter()
        .any(|a| a.tier == Tier::AsrPrimary
            && a.disposition == AttemptDisposition::Failed
            && a.reason.contains("timed out")));
}

/// Custom gate thresholds flow through the orchestrator
#[tokio::test]
async fn test_pipeline_withLenientThresholds_shouldAcceptSmallPrimaryTrack() {
    let embedded = MockTier::new(Tier::Embedded, MockTierScript::Unavailable("no subtitle stream"));
    let optical = MockTier::new(Tier::Optical, MockTierScript::Unavailable("no burned captions"));
    let primary = MockTier::new(
        Tier::AsrPrimary,
        MockTierScript::Succeed(common::healthy_track(TrackSource::AsrPrimary, 5)),
    );
    let fallback = MockTier::new(Tier::AsrFallback, MockTierScript::Fail("should not run"));

    let orchestrator = Orchestrator::new(
        Box::new(embedded),
        Box::new(optical),
        Box::new(primary),
        Box::new(fallback),
        QualityAssessor::with_thresholds(QualityThresholds {
            min_count: 3,
            ..QualityThresholds::default()
        }),
        0,
    );

    let outcome = orchestrator.run(&test_asset()).await.unwrap();
    assert_eq!(outcome.mode, TrackSource::AsrPrimary);
}
