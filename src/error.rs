// src/error.rs

use thiserror::Error;

/// Failure modes of a single pipeline run.
///
/// Only source-open problems, classifier failures and cancellation abort a
/// run. Malformed frames are skipped (the error is logged and the motion
/// baseline reset), and output-write failures degrade to best-effort
/// artifact writing.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to open video source {path}: {reason}")]
    SourceOpen { path: String, reason: String },

    #[error(
        "frame {frame_index} malformed: expected {expected} bytes for \
         {width}x{height} rgb, got {actual}"
    )]
    MalformedFrame {
        frame_index: u64,
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("classifier failed on frame {frame_index}")]
    Classifier {
        frame_index: u64,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to write output frame")]
    OutputWrite(#[source] anyhow::Error),

    #[error("run aborted before completion")]
    Aborted,
}
