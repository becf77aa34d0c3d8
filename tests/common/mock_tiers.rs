/*!
 * Scripted tier implementations for orchestrator tests.
 *
 * A `MockTier` plays back a fixed outcome and counts its invocations, so the
 * routing tests can assert both where a run ended up and which tiers were
 * never touched along the way.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use std::path::Path;

use subtier::errors::MediaError;
use subtier::extraction::{SubtitleTier, Tier, TierOutcome};
use subtier::media::{FrameGrabber, VideoAsset};
use subtier::subtitle_processor::SubtitleTrack;

/// Scripted outcome a mock tier plays back
#[derive(Clone)]
pub enum MockTierScript {
    /// Produce this track
    Succeed(SubtitleTrack),
    /// Report the tier as unavailable
    Unavailable(&'static str),
    /// Report the tier as failed
    Fail(&'static str),
    /// Sleep for the given time, then produce the track (for timeout tests)
    SucceedAfter(u64, SubtitleTrack),
}

/// Tier double with a scripted outcome and an invocation counter
pub struct MockTier {
    tier: Tier,
    script: MockTierScript,
    call_count: Arc<AtomicUsize>,
}

impl MockTier {
    pub fn new(tier: Tier, script: MockTierScript) -> Self {
        Self {
            tier,
            script,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle on the shared invocation counter, usable after the tier has
    /// been boxed into the orchestrator
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.call_count)
    }
}

/// Frame grabber that pretends every capture worked, leaving the scratch
/// file empty; pairs with a scripted recognizer
pub struct NoopFrameGrabber;

#[async_trait]
impl FrameGrabber for NoopFrameGrabber {
    async fn capture(&self, _asset: &VideoAsset, _at_secs: f64, _output: &Path) -> Result<(), MediaError> {
        Ok(())
    }
}

#[async_trait]
impl SubtitleTier for MockTier {
    fn tier(&self) -> Tier {
        self.tier
    }

    async fn attempt(&self, _asset: &VideoAsset) -> TierOutcome {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        match &self.script {
            MockTierScript::Succeed(track) => TierOutcome::Succeeded(track.clone()),
            MockTierScript::Unavailable(reason) => TierOutcome::Unavailable(reason.to_string()),
            MockTierScript::Fail(reason) => TierOutcome::Failed(reason.to_string()),
            MockTierScript::SucceedAfter(delay_ms, track) => {
                tokio::time::sleep(tokio::time::Duration::from_millis(*delay_ms)).await;
                TierOutcome::Succeeded(track.clone())
            }
        }
    }
}
