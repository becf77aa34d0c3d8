/*!
 * Embedded-subtitle probe: the cheapest, most trusted tier.
 *
 * Inspects the container stream table for a text subtitle stream and
 * extracts the first one losslessly. The extracted SRT lives in a scoped
 * temporary file that never outlives the attempt; the in-memory track is
 * the artifact handed back.
 */

use async_trait::async_trait;
use log::{debug, info, warn};

use crate::extraction::{SubtitleTier, Tier, TierOutcome};
use crate::media::{self, VideoAsset};
use crate::subtitle_processor::{SubtitleTrack, TrackSource};

/// Tier that extracts a pre-existing subtitle stream from the container
#[derive(Debug, Default)]
pub struct EmbeddedProbe;

impl EmbeddedProbe {
    /// Create the probe
    pub fn new() -> Self {
        Self
    }

    async fn try_extract(&self, asset: &VideoAsset) -> TierOutcome {
        let streams = match asset.subtitle_streams() {
            Ok(streams) => streams,
            Err(e) => {
                // Unreadable metadata is treated as absence, not a hard error
                warn!("Stream table unreadable, skipping embedded probe: {}", e);
                return TierOutcome::Unavailable(format!("stream table unreadable: {}", e));
            }
        };

        if streams.is_empty() {
            debug!("No subtitle streams in {:?}", asset.path());
            return TierOutcome::Unavailable("no embedded subtitle stream".to_string());
        }

        let text_streams: Vec<_> = streams
            .iter()
            .copied()
            .filter(|s| !s.is_bitmap_subtitle())
            .collect();

        let Some(stream) = text_streams.first() else {
            let codecs: Vec<&str> = streams.iter().map(|s| s.codec_name.as_str()).collect();
            return TierOutcome::Failed(format!(
                "only bitmap subtitle streams present ({}), which cannot be converted to text",
                codecs.join(", ")
            ));
        };

        info!(
            "Extracting embedded subtitle stream {} ({}{})",
            stream.index,
            stream.codec_name,
            stream
                .language
                .as_deref()
                .map(|l| format!(", {}", l))
                .unwrap_or_default()
        );

        let scratch = match tempfile::Builder::new().suffix(".srt").tempfile() {
            Ok(file) => file,
            Err(e) => return TierOutcome::Failed(format!("could not create scratch file: {}", e)),
        };

        if let Err(e) = media::extract_subtitle_stream(asset, stream.index, scratch.path()).await {
            return TierOutcome::Failed(format!("stream extraction failed: {}", e));
        }

        match SubtitleTrack::parse_srt_file(TrackSource::Embedded, scratch.path()) {
            Ok(track) => TierOutcome::Succeeded(track),
            Err(e) => TierOutcome::Failed(format!("extracted stream was not parseable: {}", e)),
        }
    }
}

#[async_trait]
impl SubtitleTier for EmbeddedProbe {
    fn tier(&self) -> Tier {
        Tier::Embedded
    }

    async fn attempt(&self, asset: &VideoAsset) -> TierOutcome {
        self.try_extract(asset).await
    }
}
