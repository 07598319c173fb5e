// src/classifier/mod.rs

use crate::types::{ClassProbs, NormalizedFrame};
use anyhow::Result;

#[cfg(feature = "backend-onnx")]
pub mod onnx;

#[cfg(feature = "backend-onnx")]
pub use onnx::OnnxClassifier;

/// Binary frame classifier: one normalized frame in, a probability
/// distribution over {no-accident, accident} out.
///
/// Pure and stateless from the pipeline's point of view; loading and
/// initializing the underlying model is an external concern. A classifier
/// failure is fatal to the run; downstream statistics would otherwise be
/// silently biased.
pub trait FrameClassifier {
    fn classify(&mut self, frame: &NormalizedFrame) -> Result<ClassProbs>;
}

impl<C: FrameClassifier + ?Sized> FrameClassifier for &mut C {
    fn classify(&mut self, frame: &NormalizedFrame) -> Result<ClassProbs> {
        (**self).classify(frame)
    }
}
