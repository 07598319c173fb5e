//! Traffic-camera accident detection.
//!
//! Scores each sampled video frame with a binary accident classifier,
//! fuses the score with motion-derived heuristics, smooths the result over
//! a bounded temporal window and produces a severity verdict plus run
//! statistics. Video I/O and the ONNX classifier are feature-gated
//! (`video-opencv`, `backend-onnx`); the pipeline itself is pure Rust.

pub mod classifier;
pub mod confidence;
mod config;
pub mod error;
pub mod motion;
pub mod pipeline;
pub mod preprocessing;
pub mod report;
pub mod severity;
pub mod smoother;
pub mod types;
pub mod video;

pub use error::PipelineError;
pub use pipeline::{CancelToken, StatusStore, VideoPipelineRunner};
pub use types::{Config, RunSummary, SeverityLevel};
