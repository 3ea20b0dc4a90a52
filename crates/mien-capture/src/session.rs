//! Capture session worker.
//!
//! Drives one source/detector/classifier triple on a tick loop and
//! appends each estimate to the journal. Detector and classifier
//! failures skip the tick; source and journal failures end the session
//! with an error. The session is the single journal writer; running two
//! sessions against one file is not supported.

use crate::classify::EmotionClassifier;
use crate::detect::{FaceDetector, FaceRegion, DEFAULT_MIN_FACE};
use crate::source::{FrameSource, SourceError};
use mien_core::{EmotionJournal, EmotionRecord, JournalError};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_ANALYZE_EVERY: u64 = 5;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("journal write failed: {0}")]
    Journal(#[from] JournalError),
    #[error("frame source failed: {0}")]
    Source(#[from] SourceError),
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Subject name recorded with each observation.
    pub subject: String,
    /// Tick period; detection runs on every tick.
    pub interval: Duration,
    /// Classification runs only on every Nth tick that has faces.
    pub analyze_every: u64,
    /// Regions with a shorter side below this are ignored.
    pub min_face: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            subject: "Guest".to_string(),
            interval: DEFAULT_INTERVAL,
            analyze_every: DEFAULT_ANALYZE_EVERY,
            min_face: DEFAULT_MIN_FACE,
        }
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Started {
        session_id: Uuid,
    },
    /// Face count in frame; emitted when the count changes.
    Faces {
        count: usize,
    },
    Observation {
        record: EmotionRecord,
    },
    /// A tick that produced no observation, with the reason.
    Skipped {
        reason: String,
    },
    Stopped {
        appended: u64,
    },
}

/// Run a capture session until cancelled or a fatal failure.
///
/// Returns the number of observations appended. The largest detected
/// region is the one analyzed.
pub async fn run_session<S, D, C>(
    config: SessionConfig,
    journal: EmotionJournal,
    mut source: S,
    mut detector: D,
    mut classifier: C,
    events: mpsc::Sender<SessionEvent>,
    cancel: CancellationToken,
) -> Result<u64, SessionError>
where
    S: FrameSource,
    D: FaceDetector,
    C: EmotionClassifier,
{
    let session_id = Uuid::new_v4();
    tracing::info!(
        %session_id,
        subject = %config.subject,
        interval_ms = config.interval.as_millis() as u64,
        "capture session started"
    );
    let _ = events.send(SessionEvent::Started { session_id }).await;

    let analyze_every = config.analyze_every.max(1);
    // tokio::time::interval panics on a zero period.
    let period = config.interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut tick = 0u64;
    let mut appended = 0u64;
    let mut last_face_count: Option<usize> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let idx = tick;
                tick += 1;

                // A dead feed ends the session; there is no next frame
                // to retry against.
                let frame = source.next_frame()?;

                let regions = match detector.detect(&frame) {
                    Ok(regions) => regions,
                    Err(err) => {
                        tracing::warn!(error = %err, "detector failed, skipping frame");
                        let _ = events
                            .send(SessionEvent::Skipped { reason: format!("detector: {err}") })
                            .await;
                        continue;
                    }
                };

                if last_face_count != Some(regions.len()) {
                    last_face_count = Some(regions.len());
                    let _ = events.send(SessionEvent::Faces { count: regions.len() }).await;
                }

                if regions.is_empty() || idx % analyze_every != 0 {
                    continue;
                }

                let Some(region) = largest_region(&regions, config.min_face) else {
                    tracing::debug!(
                        count = regions.len(),
                        min_face = config.min_face,
                        "all faces below minimum size"
                    );
                    let _ = events
                        .send(SessionEvent::Skipped {
                            reason: "faces below minimum size".to_string(),
                        })
                        .await;
                    continue;
                };

                match classifier.analyze(&frame, &region) {
                    Ok(estimate) => {
                        let label = estimate.label.to_lowercase();
                        // Append failures propagate: durability loss must
                        // not be absorbed here.
                        let record = journal.append(&config.subject, &label, estimate.confidence)?;
                        appended += 1;
                        tracing::debug!(
                            emotion = %record.emotion,
                            confidence = record.percentage,
                            "observation logged"
                        );
                        let _ = events.send(SessionEvent::Observation { record }).await;
                    }
                    Err(err) => {
                        tracing::debug!(error = %err, "classifier failed, skipping frame");
                        let _ = events
                            .send(SessionEvent::Skipped { reason: format!("classifier: {err}") })
                            .await;
                    }
                }
            }
            _ = cancel.cancelled() => {
                tracing::info!(%session_id, appended, "capture session cancelled");
                break;
            }
        }
    }

    let _ = events.send(SessionEvent::Stopped { appended }).await;
    Ok(appended)
}

fn largest_region(regions: &[FaceRegion], min_face: u32) -> Option<FaceRegion> {
    regions
        .iter()
        .filter(|region| region.min_side() >= min_face)
        .max_by_key(|region| region.area())
        .copied()
}
