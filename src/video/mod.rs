// src/video/mod.rs

use crate::types::{Frame, SmoothedState};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

#[cfg(feature = "video-opencv")]
pub mod opencv;

#[cfg(feature = "video-opencv")]
pub use self::opencv::{OpenCvSink, OpenCvSource};

/// A sequential source of raw frames plus the stream's properties.
/// Frames are 8-bit RGB and ephemeral.
pub trait FrameSource {
    fn fps(&self) -> f64;
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    /// Total frames in the source when known, for progress reporting
    fn total_frames(&self) -> Option<u64> {
        None
    }
    /// Pull the next frame; `None` signals end of stream.
    fn read_frame(&mut self) -> Result<Option<Frame>>;
}

/// Stream properties a sink needs to create writers for a run.
#[derive(Debug, Clone)]
pub struct SourceMeta {
    /// Input file stem, used in artifact names
    pub stem: String,
    pub width: usize,
    pub height: usize,
    pub fps: f64,
}

/// Writes frames to an output artifact.
///
/// The smoothed state accompanies every frame so annotated writers can
/// render a live-metrics overlay; clip writers ignore it.
pub trait FrameWriter {
    fn write(&mut self, frame: &Frame, state: &SmoothedState) -> Result<()>;
    /// Flush and close. Must be safe to call once on every exit path.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
    fn path(&self) -> Option<PathBuf> {
        None
    }
}

/// Creates output writers for one run: the optional annotated stream and
/// the accident clip opened lazily once the confirmation gate confirms.
pub trait VideoSink {
    fn annotated_writer(&mut self, meta: &SourceMeta) -> Result<Option<Box<dyn FrameWriter>>>;
    fn clip_writer(&mut self, meta: &SourceMeta) -> Result<Box<dyn FrameWriter>>;
}

/// Sink producing no artifacts. Clip writers discard their frames.
#[derive(Debug, Default)]
pub struct NullSink;

struct DiscardWriter;

impl FrameWriter for DiscardWriter {
    fn write(&mut self, _frame: &Frame, _state: &SmoothedState) -> Result<()> {
        Ok(())
    }
}

impl VideoSink for NullSink {
    fn annotated_writer(&mut self, _meta: &SourceMeta) -> Result<Option<Box<dyn FrameWriter>>> {
        Ok(None)
    }

    fn clip_writer(&mut self, _meta: &SourceMeta) -> Result<Box<dyn FrameWriter>> {
        Ok(Box::new(DiscardWriter))
    }
}

/// Scan a directory tree for video files by extension.
pub fn find_video_files(input_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut videos = Vec::new();

    let video_extensions = ["mp4", "avi", "mov", "mkv", "MP4", "AVI", "MOV", "MKV"];

    for entry in WalkDir::new(input_dir.as_ref())
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if let Some(ext) = path.extension() {
            if video_extensions.contains(&ext.to_str().unwrap_or("")) {
                videos.push(path.to_path_buf());
            }
        }
    }

    videos.sort();
    info!("Found {} video files", videos.len());
    Ok(videos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_video_files_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.mp4"), b"").unwrap();
        fs::write(dir.path().join("b.MOV"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let videos = find_video_files(dir.path()).unwrap();
        assert_eq!(videos.len(), 2);
        assert!(videos.iter().all(|p| p.extension().is_some()));
    }

    #[test]
    fn test_find_video_files_recurses() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("cam1");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("feed.avi"), b"").unwrap();

        let videos = find_video_files(dir.path()).unwrap();
        assert_eq!(videos.len(), 1);
    }
}
