// src/pipeline/runner.rs
//
// Drives one video through the frame-scoring chain: normalize -> motion ->
// classify -> confidence -> temporal smoothing, accumulating run statistics
// and gating the accident clip on consecutive confirmation. One runner owns
// its window, counters and writers exclusively; nothing is shared across
// runs.

use crate::classifier::FrameClassifier;
use crate::confidence;
use crate::error::PipelineError;
use crate::motion;
use crate::pipeline::gate::{ConfirmationGate, GateDecision};
use crate::pipeline::metrics::PipelineMetrics;
use crate::pipeline::stats::RunningStats;
use crate::pipeline::status::StatusHandle;
use crate::preprocessing;
use crate::severity::SeverityClassifier;
use crate::smoother::TemporalSmoother;
use crate::types::{Config, NormalizedFrame, PredictionSample, RunSummary};
use crate::video::{FrameSource, FrameWriter, SourceMeta, VideoSink};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How often (in sampled frames) progress is reported
const PROGRESS_INTERVAL: u64 = 30;

/// Cooperative cancellation flag shared with the orchestration layer.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Streaming,
    Finalizing,
    Done,
    Failed,
}

pub struct VideoPipelineRunner<C: FrameClassifier> {
    config: Config,
    classifier: C,
    state: RunState,
    metrics: PipelineMetrics,
}

impl<C: FrameClassifier> VideoPipelineRunner<C> {
    pub fn new(config: Config, classifier: C) -> Self {
        Self {
            config,
            classifier,
            state: RunState::Idle,
            metrics: PipelineMetrics::new(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    fn transition(&mut self, next: RunState) {
        debug!("Pipeline state: {:?} → {:?}", self.state, next);
        self.state = next;
    }

    /// Process the whole stream and produce the run's aggregate summary.
    ///
    /// Fatal outcomes are classifier failures and cancellation; malformed
    /// frames are skipped (with the motion baseline reset) and artifact
    /// write failures only degrade the outputs. On abort the writers are
    /// still finalized but no summary is emitted.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        stem: &str,
        sink: &mut dyn VideoSink,
        cancel: &CancelToken,
        status: &StatusHandle,
    ) -> Result<RunSummary, PipelineError> {
        let meta = SourceMeta {
            stem: stem.to_string(),
            width: source.width(),
            height: source.height(),
            fps: source.fps(),
        };
        let total_frames = source.total_frames();

        self.transition(RunState::Streaming);
        status.processing(0.0);

        let mut annotated = match sink.annotated_writer(&meta) {
            Ok(writer) => writer,
            Err(e) => {
                warn!("{}", PipelineError::OutputWrite(e));
                self.metrics.inc(&self.metrics.write_failures);
                None
            }
        };
        let mut clip: Option<Box<dyn FrameWriter>> = None;

        let detection = self.config.detection.clone();
        let mut smoother = TemporalSmoother::new(
            detection.temporal_window,
            detection.confidence_threshold,
            detection.motion_threshold,
        );
        let mut gate = ConfirmationGate::new(detection.accident_threshold, detection.confirm_frames);
        let mut stats = RunningStats::new();
        let severity = SeverityClassifier::new(self.config.severity.policy);

        let mut previous: Option<NormalizedFrame> = None;
        let mut decoded: u64 = 0;
        let stride = detection.frame_stride;

        loop {
            if cancel.is_cancelled() {
                warn!("Run aborted after {} frames", stats.count());
                finish_writers(&mut annotated, &mut clip);
                self.transition(RunState::Failed);
                return Err(PipelineError::Aborted);
            }

            let frame = match source.read_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Frame read failed, treating as end of stream: {e:#}");
                    None
                }
            };
            let Some(frame) = frame else {
                break;
            };

            decoded += 1;
            self.metrics.inc(&self.metrics.frames_decoded);
            if decoded % stride != 0 {
                continue;
            }

            if frame.data.len() != frame.expected_len() {
                let err = PipelineError::MalformedFrame {
                    frame_index: decoded,
                    width: frame.width,
                    height: frame.height,
                    expected: frame.expected_len(),
                    actual: frame.data.len(),
                };
                warn!("Skipping frame: {err}");
                self.metrics.inc(&self.metrics.frames_malformed);
                // The next motion comparison degrades to the
                // no-prior-frame case
                previous = None;
                continue;
            }

            self.metrics.inc(&self.metrics.frames_sampled);

            let normalized = preprocessing::normalize(
                &frame,
                self.config.model.input_width,
                self.config.model.input_height,
            );
            let motion_metrics = motion::measure(previous.as_ref(), &normalized);

            let probs = match self.classifier.classify(&normalized) {
                Ok(probs) => probs,
                Err(source_err) => {
                    finish_writers(&mut annotated, &mut clip);
                    self.transition(RunState::Failed);
                    return Err(PipelineError::Classifier {
                        frame_index: decoded,
                        source: source_err,
                    });
                }
            };

            let fused = confidence::score(&probs, &motion_metrics);
            let smoothed = smoother.observe(
                PredictionSample {
                    probability: probs.accident,
                    confidence: fused,
                },
                motion_metrics.score,
            );
            stats.record(smoothed.smoothed_prediction, &motion_metrics);

            match gate.observe(probs.accident) {
                GateDecision::JustConfirmed => {
                    info!(
                        "Accident confirmed at frame {} ({} consecutive above {:.2})",
                        decoded,
                        gate.consecutive(),
                        detection.accident_threshold
                    );
                    self.metrics.inc(&self.metrics.gate_openings);
                    match sink.clip_writer(&meta) {
                        Ok(writer) => clip = Some(writer),
                        Err(e) => {
                            warn!("{}", PipelineError::OutputWrite(e));
                            self.metrics.inc(&self.metrics.write_failures);
                        }
                    }
                    self.write_clip_frame(&mut clip, &frame, &smoothed);
                }
                GateDecision::Open => {
                    self.write_clip_frame(&mut clip, &frame, &smoothed);
                }
                GateDecision::Closed => {}
            }

            if let Some(writer) = annotated.as_deref_mut() {
                match writer.write(&frame, &smoothed) {
                    Ok(()) => self.metrics.inc(&self.metrics.annotated_frames_written),
                    Err(e) => {
                        warn!("{}", PipelineError::OutputWrite(e));
                        self.metrics.inc(&self.metrics.write_failures);
                    }
                }
            }

            previous = Some(normalized);

            if stats.count() % PROGRESS_INTERVAL == 0 {
                let progress = total_frames
                    .map(|total| (decoded as f32 / total as f32) * 100.0)
                    .unwrap_or(0.0);
                info!(
                    "Frame {}: prediction {:.1}% | motion {:.2} | reliability {}",
                    stats.count(),
                    smoothed.smoothed_prediction,
                    smoothed.avg_motion,
                    if smoothed.is_reliable { "High" } else { "Low" }
                );
                status.processing(progress);
            }
        }

        self.transition(RunState::Finalizing);

        let mean = stats.mean();
        let mean_motion = stats.mean_motion();
        let verdict = severity.classify(mean / 100.0, &mean_motion, gate.accuracy());

        let summary = RunSummary {
            mean_prediction: mean,
            std_prediction: stats.std(),
            max_prediction: stats.max(),
            min_prediction: stats.min(),
            total_frames: stats.count(),
            mean_motion,
            gate_accuracy: gate.accuracy(),
            verdict,
        };

        finish_writers(&mut annotated, &mut clip);
        self.transition(RunState::Done);

        info!(
            "Run complete: {} frames, mean prediction {:.1}%, severity {} ({:.1})",
            summary.total_frames,
            summary.mean_prediction,
            summary.verdict.level.as_str(),
            summary.verdict.score
        );

        Ok(summary)
    }

    fn write_clip_frame(
        &self,
        clip: &mut Option<Box<dyn FrameWriter>>,
        frame: &crate::types::Frame,
        smoothed: &crate::types::SmoothedState,
    ) {
        if let Some(writer) = clip.as_deref_mut() {
            match writer.write(frame, smoothed) {
                Ok(()) => self.metrics.inc(&self.metrics.clip_frames_written),
                Err(e) => {
                    warn!("{}", PipelineError::OutputWrite(e));
                    self.metrics.inc(&self.metrics.write_failures);
                }
            }
        }
    }
}

/// Flush and close whatever writers exist. Called on every exit path.
fn finish_writers(
    annotated: &mut Option<Box<dyn FrameWriter>>,
    clip: &mut Option<Box<dyn FrameWriter>>,
) {
    for writer in [annotated, clip].into_iter().flatten() {
        if let Err(e) = writer.finish() {
            warn!("Failed to finalize output writer: {e:#}");
        }
    }
}
