/*!
 * Speech-recognition tier: demux the audio, hand it to a transcription
 * backend, shape the segments into a track.
 *
 * The same tier type wraps both the primary and the fallback backend; which
 * one it is only shows in the tier tag and the source of the produced track.
 */

use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};

use crate::engines::{Transcriber, TranscriptSegment};
use crate::extraction::{SubtitleTier, Tier, TierOutcome};
use crate::media::{self, VideoAsset};
use crate::subtitle_processor::{SubtitleCue, SubtitleTrack, TrackSource};

/// Tier that runs one transcription backend end-to-end
pub struct AsrTier {
    tier: Tier,
    transcriber: Arc<dyn Transcriber>,
}

impl AsrTier {
    /// Wrap the primary backend
    pub fn primary(transcriber: Arc<dyn Transcriber>) -> Self {
        Self {
            tier: Tier::AsrPrimary,
            transcriber,
        }
    }

    /// Wrap the fallback backend
    pub fn fallback(transcriber: Arc<dyn Transcriber>) -> Self {
        Self {
            tier: Tier::AsrFallback,
            transcriber,
        }
    }

    fn source(&self) -> TrackSource {
        match self.tier {
            Tier::AsrFallback => TrackSource::AsrFallback,
            _ => TrackSource::AsrPrimary,
        }
    }
}

#[async_trait]
impl SubtitleTier for AsrTier {
    fn tier(&self) -> Tier {
        self.tier
    }

    async fn attempt(&self, asset: &VideoAsset) -> TierOutcome {
        if let Err(e) = self.transcriber.probe().await {
            return TierOutcome::Unavailable(format!("{}: {}", self.transcriber.name(), e));
        }

        let audio = match tempfile::Builder::new().suffix(".wav").tempfile() {
            Ok(file) => file,
            Err(e) => return TierOutcome::Failed(format!("could not create scratch file: {}", e)),
        };

        if let Err(e) = media::demux_audio(asset, audio.path()).await {
            return TierOutcome::Failed(format!("audio demux failed: {}", e));
        }

        info!("Transcribing with {}", self.transcriber.name());

        let segments = match self.transcriber.transcribe(audio.path()).await {
            Ok(segments) => segments,
            Err(e) if e.is_unavailable() => {
                return TierOutcome::Unavailable(format!("{}: {}", self.transcriber.name(), e));
            }
            Err(e) => {
                return TierOutcome::Failed(format!("{}: {}", self.transcriber.name(), e));
            }
        };

        if segments.is_empty() {
            return TierOutcome::Failed(format!(
                "{} produced no segments",
                self.transcriber.name()
            ));
        }

        let cues = segments_to_cues(segments);

        if cues.is_empty() {
            return TierOutcome::Failed(format!(
                "{} produced no usable segments",
                self.transcriber.name()
            ));
        }

        TierOutcome::Succeeded(SubtitleTrack::from_cues(self.source(), cues))
    }
}

/// Shape backend segments into cues
///
/// Short and even empty texts are retained as placeholders; the quality
/// assessor counts them. Zero-length time ranges are not representable as
/// cues and are dropped.
fn segments_to_cues(segments: Vec<TranscriptSegment>) -> Vec<SubtitleCue> {
    let mut cues = Vec::new();
    for segment in segments {
        if segment.end_ms <= segment.start_ms {
            warn!(
                "Dropping segment with invalid time range {}..{}",
                segment.start_ms, segment.end_ms
            );
            continue;
        }
        cues.push(SubtitleCue::new(
            cues.len() + 1,
            segment.start_ms,
            segment.end_ms,
            segment.text.trim().to_string(),
        ));
    }
    cues
}
