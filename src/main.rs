// src/main.rs

use accident_detection::classifier::OnnxClassifier;
use accident_detection::error::PipelineError;
use accident_detection::pipeline::{CancelToken, StatusStore, VideoPipelineRunner};
use accident_detection::report;
use accident_detection::types::Config;
use accident_detection::video::{self, OpenCvSink, OpenCvSource};
use anyhow::Result;
use tracing::{error, info, warn};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("accident_detection=info,ort=warn")
        .init();

    info!("🚦 Accident Detection System Starting");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    let config = Config::load(&config_path)?;
    info!("✓ Configuration loaded");

    info!(
        "Detection thresholds: confidence={:.2}, motion={:.2}, confirm_frames={}",
        config.detection.confidence_threshold,
        config.detection.motion_threshold,
        config.detection.confirm_frames
    );

    let mut classifier = OnnxClassifier::new(&config)?;
    info!("✓ Classifier ready");

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            warn!("Interrupt received, stopping after the current frame");
            cancel.cancel();
        })?;
    }

    let status = StatusStore::new();
    let videos = video::find_video_files(&config.video.input_dir)?;

    if videos.is_empty() {
        error!("No video files found in {}", config.video.input_dir);
        return Ok(());
    }

    for path in videos {
        let key = path.file_name().unwrap_or_default().to_string_lossy().into_owned();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        let handle = status.handle(&key);
        handle.queued();

        let mut source = match OpenCvSource::open(&path) {
            Ok(source) => source,
            Err(e) => {
                let err = PipelineError::SourceOpen {
                    path: path.display().to_string(),
                    reason: format!("{e:#}"),
                };
                error!("{err}");
                handle.failed(err.to_string());
                continue;
            }
        };

        let mut sink = OpenCvSink::new(&config);
        let mut runner = VideoPipelineRunner::new(config.clone(), &mut classifier);

        match runner.run(&mut source, &stem, &mut sink, &cancel, &handle) {
            Ok(summary) => {
                let record = report::build_accident_record(
                    &summary,
                    &config.report.location,
                    &path,
                    sink.clip_path.as_deref(),
                );
                report::log_record(&record);
                if let Err(e) = report::append_record(&config.report.records_path, &record) {
                    warn!("Failed to persist record: {e:#}");
                }
                handle.done(summary.verdict.level);
            }
            Err(PipelineError::Aborted) => {
                warn!("Processing aborted: {}", path.display());
                handle.failed("aborted");
                break;
            }
            Err(e) => {
                error!("Failed to process {}: {e}", path.display());
                handle.failed(e.to_string());
            }
        }
    }

    info!("All videos processed");
    Ok(())
}
