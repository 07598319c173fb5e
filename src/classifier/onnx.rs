// src/classifier/onnx.rs

use crate::classifier::FrameClassifier;
use crate::types::{ClassProbs, Config, NormalizedFrame};
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use tracing::{debug, info};

/// ONNX-backed accident classifier.
///
/// Expects a model taking one NHWC f32 tensor `[1, H, W, 3]` in [0,1] and
/// producing two class scores ordered [no-accident, accident].
pub struct OnnxClassifier {
    session: Session,
    input_width: usize,
    input_height: usize,
}

impl OnnxClassifier {
    pub fn new(config: &Config) -> Result<Self> {
        info!("Initializing classifier");
        info!("Model path: {}", config.model.path);

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.inference.num_threads)?
            .with_inter_threads(1)?
            .commit_from_file(&config.model.path)
            .context("Failed to load model")?;

        info!("✓ Classifier initialized successfully");

        Ok(Self {
            session,
            input_width: config.model.input_width,
            input_height: config.model.input_height,
        })
    }
}

impl FrameClassifier for OnnxClassifier {
    fn classify(&mut self, frame: &NormalizedFrame) -> Result<ClassProbs> {
        debug!("Running inference");

        anyhow::ensure!(
            frame.width == self.input_width && frame.height == self.input_height,
            "frame {}x{} does not match model input {}x{}",
            frame.width,
            frame.height,
            self.input_width,
            self.input_height,
        );

        let shape = [1usize, frame.height, frame.width, 3];
        let input_value = ort::value::Value::from_array((
            shape.as_slice(),
            frame.data.clone().into_boxed_slice(),
        ))?;

        let outputs = self.session.run(ort::inputs!["input" => input_value])?;

        let (_, scores) = outputs[0].try_extract_tensor::<f32>()?;
        anyhow::ensure!(
            scores.len() >= 2,
            "model produced {} outputs, expected a class pair",
            scores.len()
        );

        let (no_accident, accident) = to_probabilities(scores[0], scores[1]);
        Ok(ClassProbs {
            no_accident,
            accident,
        })
    }
}

/// Models exported with a softmax head emit probabilities already; raw
/// logit heads need one applied here.
fn to_probabilities(a: f32, b: f32) -> (f32, f32) {
    let looks_like_probs =
        (0.0..=1.0).contains(&a) && (0.0..=1.0).contains(&b) && ((a + b) - 1.0).abs() < 1e-3;
    if looks_like_probs {
        return (a, b);
    }

    let max = a.max(b);
    let ea = (a - max).exp();
    let eb = (b - max).exp();
    (ea / (ea + eb), eb / (ea + eb))
}
