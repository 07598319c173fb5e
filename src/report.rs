// src/report.rs
//
// Builds the structured record handed to persistence and alerting
// collaborators once a run reaches Done. The record is the boundary: SQL,
// SMS and HTTP live on the far side of it.

use crate::types::{RunSummary, SeverityLevel};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct PredictionSummary {
    pub mean: f32,
    pub std: f32,
    pub max: f32,
    pub min: f32,
    pub total_frames: u64,
}

/// One accident-analysis record, immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct AccidentRecord {
    pub timestamp: String,
    pub location: String,
    pub severity_level: SeverityLevel,
    pub severity_score: f32,
    pub video_path: String,
    pub clip_path: Option<String>,
    /// Mean accident probability (percent): the gate's when it opened,
    /// otherwise the run mean
    pub accuracy: f32,
    pub prediction_summary: PredictionSummary,
}

pub fn build_accident_record(
    summary: &RunSummary,
    location: &str,
    video_path: &Path,
    clip_path: Option<&Path>,
) -> AccidentRecord {
    AccidentRecord {
        timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        location: location.to_string(),
        severity_level: summary.verdict.level,
        severity_score: summary.verdict.score,
        video_path: video_path.display().to_string(),
        clip_path: clip_path.map(|p| p.display().to_string()),
        accuracy: summary.gate_accuracy.unwrap_or(summary.mean_prediction),
        prediction_summary: PredictionSummary {
            mean: summary.mean_prediction,
            std: summary.std_prediction,
            max: summary.max_prediction,
            min: summary.min_prediction,
            total_frames: summary.total_frames,
        },
    }
}

/// Append the record to a JSON-lines file.
pub fn append_record(path: impl AsRef<Path>, record: &AccidentRecord) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open records file {}", path.display()))?;

    let line = serde_json::to_string(record)?;
    writeln!(file, "{line}")?;
    Ok(())
}

pub fn log_record(record: &AccidentRecord) {
    info!(
        "Accident record: {} | {} | severity {} ({:.1}) | accuracy {:.1}% | {}",
        record.timestamp,
        record.location,
        record.severity_level.as_str(),
        record.severity_score,
        record.accuracy,
        record.video_path,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MotionMetrics, SeverityVerdict};

    fn summary() -> RunSummary {
        RunSummary {
            mean_prediction: 82.5,
            std_prediction: 4.2,
            max_prediction: 95.0,
            min_prediction: 61.0,
            total_frames: 120,
            mean_motion: MotionMetrics {
                score: 0.3,
                variance: 0.02,
                area_fraction: 0.5,
            },
            gate_accuracy: Some(88.0),
            verdict: SeverityVerdict {
                level: SeverityLevel::High,
                score: 86.0,
            },
        }
    }

    #[test]
    fn test_record_prefers_gate_accuracy() {
        let record = build_accident_record(
            &summary(),
            "Kigali",
            Path::new("videos/cam1.mp4"),
            Some(Path::new("accident_clips/accident_1.mp4")),
        );

        assert_eq!(record.accuracy, 88.0);
        assert_eq!(record.severity_level, SeverityLevel::High);
        assert_eq!(record.prediction_summary.total_frames, 120);
        assert!(record.clip_path.is_some());
    }

    #[test]
    fn test_record_falls_back_to_run_mean() {
        let mut s = summary();
        s.gate_accuracy = None;
        let record = build_accident_record(&s, "Kigali", Path::new("cam1.mp4"), None);

        assert_eq!(record.accuracy, 82.5);
        assert_eq!(record.clip_path, None);
    }

    #[test]
    fn test_append_record_writes_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.jsonl");

        let record = build_accident_record(&summary(), "Kigali", Path::new("cam1.mp4"), None);
        append_record(&path, &record).unwrap();
        append_record(&path, &record).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["severity_level"], "high");
        assert_eq!(parsed["location"], "Kigali");
    }
}
