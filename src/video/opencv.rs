// src/video/opencv.rs

use crate::types::{Config, Frame, SmoothedState};
use crate::video::{FrameSource, FrameWriter, SourceMeta, VideoSink};
use anyhow::{Context, Result};
use opencv::{
    core::{self, Mat},
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureTraitConst, VideoWriter},
};
use std::path::{Path, PathBuf};
use tracing::info;

/// OpenCV-backed frame source for a video file.
pub struct OpenCvSource {
    cap: VideoCapture,
    fps: f64,
    total_frames: u64,
    current_frame: u64,
    width: usize,
    height: usize,
}

impl OpenCvSource {
    pub fn open(path: &Path) -> Result<Self> {
        info!("Opening video: {}", path.display());

        let path_str = path
            .to_str()
            .context("video path is not valid UTF-8")?;
        let cap = VideoCapture::from_file(path_str, videoio::CAP_ANY)?;

        if !cap.is_opened()? {
            anyhow::bail!("Failed to open video file");
        }

        let fps = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FPS)?;
        let total_frames = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_COUNT)? as u64;
        let width = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_WIDTH)? as usize;
        let height = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_HEIGHT)? as usize;

        info!(
            "Video properties: {}x{} @ {:.1} FPS, {} frames",
            width, height, fps, total_frames
        );

        Ok(Self {
            cap,
            fps,
            total_frames,
            current_frame: 0,
            width,
            height,
        })
    }

}

impl FrameSource for OpenCvSource {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn total_frames(&self) -> Option<u64> {
        (self.total_frames > 0).then_some(self.total_frames)
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        use opencv::videoio::VideoCaptureTrait;

        let mut mat = Mat::default();

        if !VideoCaptureTrait::read(&mut self.cap, &mut mat)? || mat.empty() {
            return Ok(None);
        }

        self.current_frame += 1;
        let timestamp_ms = (self.current_frame as f64 / self.fps.max(1.0)) * 1000.0;

        let mut rgb_mat = Mat::default();
        imgproc::cvt_color(&mat, &mut rgb_mat, imgproc::COLOR_BGR2RGB, 0)?;

        let data = rgb_mat.data_bytes()?.to_vec();

        Ok(Some(Frame {
            data,
            width: self.width,
            height: self.height,
            timestamp_ms,
        }))
    }
}

/// Creates mp4 writers for the annotated stream and accident clips, named
/// after the input stem and the run timestamp.
pub struct OpenCvSink {
    output_dir: PathBuf,
    clips_dir: PathBuf,
    save_annotated: bool,
    run_timestamp: String,
    pub annotated_path: Option<PathBuf>,
    pub clip_path: Option<PathBuf>,
}

impl OpenCvSink {
    pub fn new(config: &Config) -> Self {
        Self {
            output_dir: PathBuf::from(&config.video.output_dir),
            clips_dir: PathBuf::from(&config.video.clips_dir),
            save_annotated: config.video.save_annotated,
            run_timestamp: chrono::Local::now().format("%Y%m%d_%H%M%S").to_string(),
            annotated_path: None,
            clip_path: None,
        }
    }

    fn open_writer(path: &Path, meta: &SourceMeta) -> Result<VideoWriter> {
        let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
        let writer = VideoWriter::new(
            path.to_str().context("output path is not valid UTF-8")?,
            fourcc,
            meta.fps,
            core::Size::new(meta.width as i32, meta.height as i32),
            true,
        )?;
        Ok(writer)
    }
}

impl VideoSink for OpenCvSink {
    fn annotated_writer(&mut self, meta: &SourceMeta) -> Result<Option<Box<dyn FrameWriter>>> {
        if !self.save_annotated {
            return Ok(None);
        }

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!("{}_annotated.mp4", meta.stem));
        info!("Output video: {}", path.display());

        let writer = Self::open_writer(&path, meta)?;
        self.annotated_path = Some(path.clone());
        Ok(Some(Box::new(AnnotatedWriter {
            writer,
            path,
            height: meta.height,
        })))
    }

    fn clip_writer(&mut self, meta: &SourceMeta) -> Result<Box<dyn FrameWriter>> {
        std::fs::create_dir_all(&self.clips_dir)?;
        let path = self
            .clips_dir
            .join(format!("accident_{}.mp4", self.run_timestamp));
        info!("Accident clip: {}", path.display());

        let writer = Self::open_writer(&path, meta)?;
        self.clip_path = Some(path.clone());
        Ok(Box::new(ClipWriter {
            writer,
            path,
            height: meta.height,
        }))
    }
}

struct AnnotatedWriter {
    writer: VideoWriter,
    path: PathBuf,
    height: usize,
}

impl FrameWriter for AnnotatedWriter {
    fn write(&mut self, frame: &Frame, state: &SmoothedState) -> Result<()> {
        let mut bgr = frame_to_bgr(frame, self.height)?;
        draw_metrics_overlay(&mut bgr, state)?;
        self.writer.write(&bgr)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.release()?;
        Ok(())
    }

    fn path(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }
}

struct ClipWriter {
    writer: VideoWriter,
    path: PathBuf,
    height: usize,
}

impl FrameWriter for ClipWriter {
    fn write(&mut self, frame: &Frame, _state: &SmoothedState) -> Result<()> {
        let bgr = frame_to_bgr(frame, self.height)?;
        self.writer.write(&bgr)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.release()?;
        Ok(())
    }

    fn path(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }
}

fn frame_to_bgr(frame: &Frame, height: usize) -> Result<Mat> {
    let mat = Mat::from_slice(&frame.data)?;
    let mat = mat.reshape(3, height as i32)?;

    let mut bgr_mat = Mat::default();
    imgproc::cvt_color(&mat, &mut bgr_mat, imgproc::COLOR_RGB2BGR, 0)?;
    Ok(bgr_mat)
}

/// Draw the live-metrics overlay: prediction percentage, motion level and
/// reliability on a filled backdrop.
fn draw_metrics_overlay(output: &mut Mat, state: &SmoothedState) -> Result<()> {
    imgproc::rectangle(
        output,
        core::Rect::new(0, 0, 400, 80),
        core::Scalar::new(0.0, 0.0, 0.0, 0.0),
        -1,
        imgproc::LINE_8,
        0,
    )?;

    imgproc::put_text(
        output,
        &format!("Prediction: {:.1}%", state.smoothed_prediction),
        core::Point::new(20, 30),
        imgproc::FONT_HERSHEY_SIMPLEX,
        0.7,
        core::Scalar::new(0.0, 255.0, 0.0, 0.0),
        2,
        imgproc::LINE_8,
        false,
    )?;

    imgproc::put_text(
        output,
        &format!("Motion: {:.2}", state.avg_motion),
        core::Point::new(20, 60),
        imgproc::FONT_HERSHEY_SIMPLEX,
        0.7,
        core::Scalar::new(255.0, 255.0, 0.0, 0.0),
        2,
        imgproc::LINE_8,
        false,
    )?;

    let (label, color) = if state.is_reliable {
        ("High", core::Scalar::new(0.0, 255.0, 0.0, 0.0))
    } else {
        ("Low", core::Scalar::new(0.0, 165.0, 255.0, 0.0))
    };
    imgproc::put_text(
        output,
        &format!("Reliability: {}", label),
        core::Point::new(220, 60),
        imgproc::FONT_HERSHEY_SIMPLEX,
        0.5,
        color,
        1,
        imgproc::LINE_8,
        false,
    )?;

    Ok(())
}
