use serde::{Deserialize, Serialize};

use crate::severity::TierPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    pub inference: InferenceConfig,
    pub detection: DetectionConfig,
    pub severity: SeverityConfig,
    pub video: VideoConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub path: String,
    pub input_width: usize,
    pub input_height: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub num_threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Sliding-window capacity for temporal smoothing
    pub temporal_window: usize,
    /// Average fused confidence at or above this marks the window reliable
    pub confidence_threshold: f32,
    /// Average motion score above this marks the window as having motion
    pub motion_threshold: f32,
    /// Process every Nth decoded frame (1 = every frame)
    pub frame_stride: u64,
    /// Accident probability a frame must exceed to count toward confirmation
    pub accident_threshold: f32,
    /// Consecutive qualifying frames required before the clip opens
    pub confirm_frames: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityConfig {
    pub policy: TierPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    pub input_dir: String,
    pub output_dir: String,
    pub clips_dir: String,
    pub save_annotated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub location: String,
    pub records_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig {
                path: "model.onnx".to_string(),
                input_width: 250,
                input_height: 250,
            },
            inference: InferenceConfig { num_threads: 4 },
            detection: DetectionConfig {
                temporal_window: 5,
                confidence_threshold: 0.75,
                motion_threshold: 0.15,
                frame_stride: 1,
                accident_threshold: 0.70,
                confirm_frames: 5,
            },
            severity: SeverityConfig {
                policy: TierPolicy::default(),
            },
            video: VideoConfig {
                input_dir: "videos".to_string(),
                output_dir: "processed_videos".to_string(),
                clips_dir: "accident_clips".to_string(),
                save_annotated: true,
            },
            report: ReportConfig {
                location: "Kigali".to_string(),
                records_path: "accident_records.jsonl".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

/// One decoded video frame: tightly-packed 8-bit RGB, HWC.
///
/// Frames are ephemeral: owned by the pipeline iteration that produced
/// them and released once consumed, except when buffered into an
/// accident clip.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub timestamp_ms: f64,
}

impl Frame {
    pub fn expected_len(&self) -> usize {
        self.width * self.height * 3
    }
}

/// A frame in the classifier's canonical format: f32 RGB, HWC,
/// values in [0,1], fixed target resolution. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFrame {
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
}

impl NormalizedFrame {
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
}

/// Scalar summary of pixel-level change between consecutive normalized
/// frames. All-zero when there is no prior frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MotionMetrics {
    pub score: f32,
    pub variance: f32,
    pub area_fraction: f32,
}

impl MotionMetrics {
    pub const ZERO: MotionMetrics = MotionMetrics {
        score: 0.0,
        variance: 0.0,
        area_fraction: 0.0,
    };

    /// Normalize each component into [0,1] with the fixed linear caps
    /// shared by the confidence and severity formulas.
    pub fn normalized(&self) -> MotionMetrics {
        MotionMetrics {
            score: (self.score * 2.0).min(1.0),
            variance: (self.variance * 10.0).min(1.0),
            area_fraction: (self.area_fraction * 2.0).min(1.0),
        }
    }
}

/// Classifier output for one normalized frame.
#[derive(Debug, Clone, Copy)]
pub struct ClassProbs {
    pub no_accident: f32,
    pub accident: f32,
}

impl ClassProbs {
    /// How decisive the classifier is, regardless of which class won.
    pub fn decisiveness(&self) -> f32 {
        self.no_accident.max(self.accident)
    }
}

/// Per-frame accident probability plus fused confidence, both in [0,1].
#[derive(Debug, Clone, Copy)]
pub struct PredictionSample {
    pub probability: f32,
    pub confidence: f32,
}

/// Windowed view of the recent past, produced once per observed frame.
#[derive(Debug, Clone, Copy)]
pub struct SmoothedState {
    /// Mean windowed accident probability, as a percentage
    pub smoothed_prediction: f32,
    pub avg_confidence: f32,
    pub avg_motion: f32,
    pub is_reliable: bool,
    pub has_significant_motion: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    Low,
    Medium,
    High,
}

impl SeverityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityLevel::Low => "Low",
            SeverityLevel::Medium => "Medium",
            SeverityLevel::High => "High",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SeverityVerdict {
    pub level: SeverityLevel,
    /// Numeric severity in [0,100]
    pub score: f32,
}

/// Aggregate statistics over one processed video. Immutable once the run
/// completes; handed to persistence/alerting collaborators as a value.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub mean_prediction: f32,
    pub std_prediction: f32,
    pub max_prediction: f32,
    pub min_prediction: f32,
    /// Frames the pipeline actually iterated (post-stride), not the
    /// file's total frame count
    pub total_frames: u64,
    pub mean_motion: MotionMetrics,
    /// Mean accident probability (percent) across gate-open frames, when
    /// the confirmation gate opened
    pub gate_accuracy: Option<f32>,
    pub verdict: SeverityVerdict,
}
