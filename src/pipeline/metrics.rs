// src/pipeline/metrics.rs
//
// Run observability. Tracks frame counts, gate activity and artifact
// writes for one pipeline run. Export via logs at run end.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub frames_decoded: Arc<AtomicU64>,
    pub frames_sampled: Arc<AtomicU64>,
    pub frames_malformed: Arc<AtomicU64>,
    pub gate_openings: Arc<AtomicU64>,
    pub clip_frames_written: Arc<AtomicU64>,
    pub annotated_frames_written: Arc<AtomicU64>,
    pub write_failures: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            frames_decoded: Arc::new(AtomicU64::new(0)),
            frames_sampled: Arc::new(AtomicU64::new(0)),
            frames_malformed: Arc::new(AtomicU64::new(0)),
            gate_openings: Arc::new(AtomicU64::new(0)),
            clip_frames_written: Arc::new(AtomicU64::new(0)),
            annotated_frames_written: Arc::new(AtomicU64::new(0)),
            write_failures: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fps(&self) -> f64 {
        let frames = self.frames_sampled.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            frames_decoded: self.frames_decoded.load(Ordering::Relaxed),
            frames_sampled: self.frames_sampled.load(Ordering::Relaxed),
            frames_malformed: self.frames_malformed.load(Ordering::Relaxed),
            gate_openings: self.gate_openings.load(Ordering::Relaxed),
            clip_frames_written: self.clip_frames_written.load(Ordering::Relaxed),
            annotated_frames_written: self.annotated_frames_written.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            fps: self.fps(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub frames_decoded: u64,
    pub frames_sampled: u64,
    pub frames_malformed: u64,
    pub gate_openings: u64,
    pub clip_frames_written: u64,
    pub annotated_frames_written: u64,
    pub write_failures: u64,
    pub fps: f64,
    pub elapsed_secs: f64,
}
