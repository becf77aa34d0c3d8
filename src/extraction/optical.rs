/*!
 * Optical tier: detection and extraction of burned-in captions.
 *
 * Detection samples a handful of fixed timestamps; any frame with
 * recognizable text flips the tier into full extraction over a uniform grid
 * spanning the whole duration. Frame captures are scoped temporary files,
 * deleted on every exit path, and samples are recognized concurrently since
 * they share no state.
 *
 * Consecutive frames showing the same caption each produce a separate cue;
 * no cross-frame merging is performed. Downstream consumers that need
 * deduplicated captions must collapse the runs themselves.
 */

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};

use crate::app_config::OpticalConfig;
use crate::engines::TextRecognizer;
use crate::extraction::{SubtitleTier, Tier, TierOutcome};
use crate::media::{FfmpegFrameGrabber, FrameGrabber, VideoAsset};
use crate::subtitle_processor::{SubtitleCue, SubtitleTrack, TrackSource};

/// Tier that recovers burned-in captions with an image-to-text recognizer
pub struct OpticalTier {
    recognizer: Arc<dyn TextRecognizer>,
    grabber: Arc<dyn FrameGrabber>,
    config: OpticalConfig,
}

impl OpticalTier {
    /// Create the tier around a recognizer and its sampling configuration
    pub fn new(recognizer: Arc<dyn TextRecognizer>, config: OpticalConfig) -> Self {
        Self::with_frame_grabber(recognizer, Arc::new(FfmpegFrameGrabber), config)
    }

    /// Create the tier with an explicit frame capture implementation
    pub fn with_frame_grabber(
        recognizer: Arc<dyn TextRecognizer>,
        grabber: Arc<dyn FrameGrabber>,
        config: OpticalConfig,
    ) -> Self {
        Self {
            recognizer,
            grabber,
            config,
        }
    }

    /// Detection offsets bounded to the actual duration
    ///
    /// Offsets beyond the end of the video are dropped; when every
    /// configured offset lies beyond the end, a single mid-duration sample
    /// substitutes so short clips are still probed.
    fn detection_offsets(&self, duration_secs: f64) -> Vec<f64> {
        let offsets: Vec<f64> = self
            .config
            .sample_offsets_secs
            .iter()
            .copied()
            .filter(|offset| *offset < duration_secs)
            .collect();

        if offsets.is_empty() {
            vec![duration_secs / 2.0]
        } else {
            offsets
        }
    }

    /// Capture one frame and recognize it, cleaning the frame up regardless
    /// of outcome
    ///
    /// Capture or recognition problems on a single sample degrade to "no
    /// text here" so one bad frame cannot sink the whole tier.
    async fn sample_frame(&self, asset: &VideoAsset, at_secs: f64) -> Option<String> {
        let frame = match tempfile::Builder::new().suffix(".jpg").tempfile() {
            Ok(file) => file,
            Err(e) => {
                warn!("Could not create frame scratch file: {}", e);
                return None;
            }
        };

        if let Err(e) = self.grabber.capture(asset, at_secs, frame.path()).await {
            debug!("Frame capture at {:.0}s failed: {}", at_secs, e);
            return None;
        }

        match self.recognizer.recognize(frame.path()).await {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                warn!("Recognition at {:.0}s failed: {}", at_secs, e);
                None
            }
        }
    }

    /// Probe a few fixed timestamps for any recognizable text
    async fn detect(&self, asset: &VideoAsset, duration_secs: f64) -> Option<f64> {
        let offsets = self.detection_offsets(duration_secs);

        debug!("Sampling {} timestamps for burned captions", offsets.len());

        // Samples are independent; recognize them concurrently and inspect
        // the results in temporal order
        let results: Vec<Option<String>> = stream::iter(offsets.iter().copied())
            .map(|offset| self.sample_frame(asset, offset))
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        offsets
            .into_iter()
            .zip(results)
            .find(|(_, text)| text.is_some())
            .map(|(offset, _)| offset)
    }

    /// Extract captions over a uniform grid spanning the whole duration
    async fn extract(&self, asset: &VideoAsset, duration_secs: f64) -> Vec<SubtitleCue> {
        let interval = self.config.extraction_interval_secs;

        let mut grid = Vec::new();
        let mut t = 0.0;
        while t < duration_secs {
            grid.push(t);
            t += interval;
        }

        info!(
            "Extracting burned captions: {} frames at {:.0}s intervals",
            grid.len(),
            interval
        );

        let results: Vec<Option<String>> = stream::iter(grid.iter().copied())
            .map(|offset| self.sample_frame(asset, offset))
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut cues = Vec::new();
        for (offset, text) in grid.into_iter().zip(results) {
            if let Some(text) = text {
                // Each caption gets the nominal duration of one sampling interval
                cues.push(SubtitleCue::from_seconds(
                    cues.len() + 1,
                    offset,
                    offset + interval,
                    text,
                ));
            }
        }

        cues
    }
}

#[async_trait]
impl SubtitleTier for OpticalTier {
    fn tier(&self) -> Tier {
        Tier::Optical
    }

    async fn attempt(&self, asset: &VideoAsset) -> TierOutcome {
        if let Err(e) = self.recognizer.probe().await {
            return TierOutcome::Unavailable(format!("{}: {}", self.recognizer.name(), e));
        }

        let Some(duration_secs) = asset.duration_secs() else {
            return TierOutcome::Failed("video duration unknown, cannot sample frames".to_string());
        };

        let Some(hit_offset) = self.detect(asset, duration_secs).await else {
            return TierOutcome::Unavailable("no burned-in captions detected".to_string());
        };

        info!("Burned captions detected at {:.0}s, running full extraction", hit_offset);

        let cues = self.extract(asset, duration_secs).await;

        if cues.is_empty() {
            return TierOutcome::Failed(
                "detection was positive but full extraction recognized no text".to_string(),
            );
        }

        TierOutcome::Succeeded(SubtitleTrack::from_cues(TrackSource::Ocr, cues))
    }
}
