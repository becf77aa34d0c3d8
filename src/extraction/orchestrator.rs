/*!
 * Pipeline orchestrator: the tier-sequencing state machine.
 *
 * Tier order encodes a cost/precision trade-off. Trusted cheap sources run
 * first, expensive machine inference last, and the quality gate keeps a
 * low-quality primary transcript from being accepted when the fallback
 * engine might do better. Each tier is attempted at most once per run, and
 * tiers run strictly sequentially so no expensive work starts speculatively.
 */

use std::time::Duration;

use log::{debug, info, warn};

use crate::extraction::quality::{QualityAssessor, QualityReport};
use crate::extraction::{
    AllTiersExhausted, AttemptDisposition, AttemptRecord, SubtitleTier, TierOutcome,
};
use crate::media::VideoAsset;
use crate::subtitle_processor::{SubtitleTrack, TrackSource};

/// Result of a successful pipeline run
#[derive(Debug)]
pub struct ExtractionOutcome {
    /// The accepted track
    pub track: SubtitleTrack,

    /// Which tier produced it
    pub mode: TrackSource,

    /// Every attempted tier in order, with its disposition
    pub attempts: Vec<AttemptRecord>,

    /// The gate report, present only when the primary-ASR tier was accepted
    pub quality: Option<QualityReport>,
}

/// States of the extraction state machine
///
/// `QualityGate` carries the candidate track produced by the primary
/// backend; the terminal states carry the run result.
enum PipelineState {
    Init,
    ProbeEmbedded,
    DetectBurned,
    RunPrimaryAsr,
    QualityGate(SubtitleTrack),
    RunFallbackAsr,
    Done(ExtractionOutcome),
    Failed(AllTiersExhausted),
}

impl PipelineState {
    fn name(&self) -> &'static str {
        match self {
            Self::Init => "Init",
            Self::ProbeEmbedded => "ProbeEmbedded",
            Self::DetectBurned => "DetectBurned",
            Self::RunPrimaryAsr => "RunPrimaryAsr",
            Self::QualityGate(_) => "QualityGate",
            Self::RunFallbackAsr => "RunFallbackAsr",
            Self::Done(_) => "Done",
            Self::Failed(_) => "Failed",
        }
    }
}

/// The tier-sequencing pipeline
pub struct Orchestrator {
    embedded: Box<dyn SubtitleTier>,
    optical: Box<dyn SubtitleTier>,
    primary: Box<dyn SubtitleTier>,
    fallback: Box<dyn SubtitleTier>,
    assessor: QualityAssessor,
    tier_timeout: Option<Duration>,
}

impl Orchestrator {
    /// Wire the four tiers, the quality assessor and the per-tier time budget
    ///
    /// A zero `tier_timeout_secs` disables the per-tier limit.
    pub fn new(
        embedded: Box<dyn SubtitleTier>,
        optical: Box<dyn SubtitleTier>,
        primary: Box<dyn SubtitleTier>,
        fallback: Box<dyn SubtitleTier>,
        assessor: QualityAssessor,
        tier_timeout_secs: u64,
    ) -> Self {
        Self {
            embedded,
            optical,
            primary,
            fallback,
            assessor,
            tier_timeout: (tier_timeout_secs > 0).then(|| Duration::from_secs(tier_timeout_secs)),
        }
    }

    /// Run the state machine over one asset
    pub async fn run(&self, asset: &VideoAsset) -> Result<ExtractionOutcome, AllTiersExhausted> {
        let mut attempts: Vec<AttemptRecord> = Vec::new();
        let mut state = PipelineState::Init;

        loop {
            debug!("Pipeline state: {}", state.name());

            state = match state {
                PipelineState::Init => PipelineState::ProbeEmbedded,

                PipelineState::ProbeEmbedded => {
                    match self.attempt_tier(&*self.embedded, asset, &mut attempts).await {
                        Some(track) => {
                            Self::record_accepted(&mut attempts, &*self.embedded, &track);
                            PipelineState::Done(ExtractionOutcome {
                                mode: track.source,
                                track,
                                attempts: Vec::new(),
                                quality: None,
                            })
                        }
                        None => PipelineState::DetectBurned,
                    }
                }

                PipelineState::DetectBurned => {
                    match self.attempt_tier(&*self.optical, asset, &mut attempts).await {
                        Some(track) => {
                            Self::record_accepted(&mut attempts, &*self.optical, &track);
                            PipelineState::Done(ExtractionOutcome {
                                mode: track.source,
                                track,
                                attempts: Vec::new(),
                                quality: None,
                            })
                        }
                        None => PipelineState::RunPrimaryAsr,
                    }
                }

                PipelineState::RunPrimaryAsr => {
                    // Backend failure skips the gate and goes straight to fallback
                    match self.attempt_tier(&*self.primary, asset, &mut attempts).await {
                        Some(track) => PipelineState::QualityGate(track),
                        None => PipelineState::RunFallbackAsr,
                    }
                }

                PipelineState::QualityGate(track) => {
                    let report = self.assessor.assess(&track);
                    info!("Quality gate: {}", report.summary());

                    if report.passed() {
                        Self::record_accepted(&mut attempts, &*self.primary, &track);
                        PipelineState::Done(ExtractionOutcome {
                            mode: track.source,
                            track,
                            attempts: Vec::new(),
                            quality: Some(report),
                        })
                    } else {
                        let reason = report.reasons.join("; ");
                        warn!("Primary transcript rejected: {}", reason);
                        attempts.push(AttemptRecord {
                            tier: self.primary.tier(),
                            disposition: AttemptDisposition::Rejected,
                            reason,
                        });
                        // The candidate track is dropped here; nothing of it
                        // reaches the disk
                        PipelineState::RunFallbackAsr
                    }
                }

                PipelineState::RunFallbackAsr => {
                    match self.attempt_tier(&*self.fallback, asset, &mut attempts).await {
                        Some(track) => {
                            Self::record_accepted(&mut attempts, &*self.fallback, &track);
                            PipelineState::Done(ExtractionOutcome {
                                mode: track.source,
                                track,
                                attempts: Vec::new(),
                                quality: None,
                            })
                        }
                        None => PipelineState::Failed(AllTiersExhausted {
                            attempts: Vec::new(),
                        }),
                    }
                }

                PipelineState::Done(mut outcome) => {
                    outcome.attempts = attempts;
                    info!("Extraction done, mode: {}", outcome.mode);
                    return Ok(outcome);
                }

                PipelineState::Failed(mut error) => {
                    error.attempts = attempts;
                    return Err(error);
                }
            };
        }
    }

    /// Attempt one tier under the time budget, recording non-success outcomes
    ///
    /// Returns the produced track on success, `None` when the run should
    /// move on to the next tier.
    async fn attempt_tier(
        &self,
        tier: &dyn SubtitleTier,
        asset: &VideoAsset,
        attempts: &mut Vec<AttemptRecord>,
    ) -> Option<SubtitleTrack> {
        info!("Attempting tier: {}", tier.tier());

        let outcome = match self.tier_timeout {
            Some(budget) => match tokio::time::timeout(budget, tier.attempt(asset)).await {
                Ok(outcome) => outcome,
                Err(_) => TierOutcome::Failed(format!(
                    "timed out after {}s",
                    budget.as_secs()
                )),
            },
            None => tier.attempt(asset).await,
        };

        match outcome {
            TierOutcome::Succeeded(track) => Some(track),
            TierOutcome::Unavailable(reason) => {
                info!("Tier {} unavailable: {}", tier.tier(), reason);
                attempts.push(AttemptRecord {
                    tier: tier.tier(),
                    disposition: AttemptDisposition::Unavailable,
                    reason,
                });
                None
            }
            TierOutcome::Failed(reason) => {
                warn!("Tier {} failed: {}", tier.tier(), reason);
                attempts.push(AttemptRecord {
                    tier: tier.tier(),
                    disposition: AttemptDisposition::Failed,
                    reason,
                });
                None
            }
        }
    }

    fn record_accepted(attempts: &mut Vec<AttemptRecord>, tier: &dyn SubtitleTier, track: &SubtitleTrack) {
        attempts.push(AttemptRecord {
            tier: tier.tier(),
            disposition: AttemptDisposition::Accepted,
            reason: format!("{} cues", track.len()),
        });
    }
}
