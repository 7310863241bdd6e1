//! Single-channel image classifier.
//!
//! Preprocessing is fixed: grayscale, square resize to the network input size,
//! scale to `[0, 1]`, then `(x - mean) / std`. The network emits one logit per
//! class; the result is the softmax argmax with confidence in percent.

use image::{DynamicImage, imageops::FilterType};
use std::path::Path;

use crate::config::ClassifierConfig;
use crate::error::ClassifierError;
use crate::models::ClassificationResult;

/// Image classifier loaded once at startup and shared read-only.
pub trait ImageClassifier: Send + Sync {
    fn classify(&self, image: &DynamicImage) -> Result<ClassificationResult, ClassifierError>;
}

/// Decodes raw upload bytes, guessing the format from content.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ClassifierError> {
    image::load_from_memory(bytes).map_err(|e| ClassifierError::Decode(e.to_string()))
}

/// Reads a label file with one `index,label` entry per line. The file must
/// hold exactly `expected` labels.
pub fn load_labels(path: &Path, expected: usize) -> Result<Vec<String>, ClassifierError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ClassifierError::ModelLoad(format!("cannot read labels {}: {}", path.display(), e))
    })?;
    let labels = parse_labels(&raw);

    if labels.len() != expected {
        return Err(ClassifierError::ModelLoad(format!(
            "label file {} has {} labels, configured for {} classes",
            path.display(),
            labels.len(),
            expected
        )));
    }
    Ok(labels)
}

fn parse_labels(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once(',') {
            Some((_index, label)) => label.trim().to_string(),
            None => line.to_string(),
        })
        .collect()
}

/// Produces the `[1, 1, size, size]` input tensor in row-major order.
pub fn preprocess(image: &DynamicImage, size: u32, mean: f32, std: f32) -> Vec<f32> {
    let gray = image.to_luma8();
    let resized = image::imageops::resize(&gray, size, size, FilterType::CatmullRom);
    resized
        .pixels()
        .map(|p| (p.0[0] as f32 / 255.0 - mean) / std)
        .collect()
}

pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index and value of the largest element; the first wins on ties.
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
}

/// Turns raw network output into a result against the loaded label set.
pub fn interpret_logits(
    logits: &[f32],
    labels: &[String],
) -> Result<ClassificationResult, ClassifierError> {
    if logits.len() != labels.len() {
        return Err(ClassifierError::Inference(format!(
            "model produced {} outputs for {} labels",
            logits.len(),
            labels.len()
        )));
    }

    let probs = softmax(logits);
    let (index, max_prob) = argmax(&probs)
        .ok_or_else(|| ClassifierError::Inference("model produced no outputs".to_string()))?;

    Ok(ClassificationResult {
        label: labels[index].clone(),
        confidence: f64::from(max_prob) * 100.0,
    })
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;

#[cfg(feature = "onnx")]
mod onnx {
    use super::{ImageClassifier, interpret_logits, load_labels, preprocess};
    use crate::config::ClassifierConfig;
    use crate::error::ClassifierError;
    use crate::models::ClassificationResult;
    use image::DynamicImage;
    use ort::session::Session;
    use std::sync::Mutex;
    use tracing::info;

    /// ONNX Runtime backed classifier.
    ///
    /// `Session::run` takes `&mut self`, so the session sits behind a mutex
    /// while the classifier itself is shared as `&self`.
    pub struct OnnxClassifier {
        session: Mutex<Session>,
        labels: Vec<String>,
        input_size: u32,
        mean: f32,
        std: f32,
    }

    impl OnnxClassifier {
        pub fn load(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
            if !config.model_path.exists() {
                return Err(ClassifierError::ModelLoad(format!(
                    "model weights not found: {}",
                    config.model_path.display()
                )));
            }

            let labels = load_labels(&config.labels_path, config.num_classes)?;

            let session = Session::builder()
                .map_err(|e: ort::Error| ClassifierError::ModelLoad(e.to_string()))?
                .with_intra_threads(2)
                .map_err(|e: ort::Error| ClassifierError::ModelLoad(e.to_string()))?
                .commit_from_file(&config.model_path)
                .map_err(|e: ort::Error| {
                    ClassifierError::ModelLoad(format!("ONNX load failed: {e}"))
                })?;

            info!(
                model = %config.model_path.display(),
                classes = labels.len(),
                input_size = config.input_size,
                "Image classifier loaded"
            );

            Ok(Self {
                session: Mutex::new(session),
                labels,
                input_size: config.input_size,
                mean: config.normalize_mean,
                std: config.normalize_std,
            })
        }
    }

    impl ImageClassifier for OnnxClassifier {
        fn classify(&self, image: &DynamicImage) -> Result<ClassificationResult, ClassifierError> {
            use ort::value::TensorRef;

            let side = self.input_size as usize;
            let pixels = preprocess(image, self.input_size, self.mean, self.std);
            let input = ndarray::Array4::from_shape_vec((1, 1, side, side), pixels)
                .map_err(|e| ClassifierError::Inference(e.to_string()))?;
            let tensor = TensorRef::from_array_view(&input)
                .map_err(|e| ClassifierError::Inference(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| ClassifierError::Inference("session lock poisoned".to_string()))?;

            let outputs = session
                .run(ort::inputs![tensor])
                .map_err(|e| ClassifierError::Inference(format!("ONNX inference failed: {e}")))?;

            let (_shape, logits) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| ClassifierError::Inference(format!("output extraction: {e}")))?;

            interpret_logits(logits, &self.labels)
        }
    }
}

/// Loads the configured classifier backend.
#[cfg(feature = "onnx")]
pub fn load_classifier(
    config: &ClassifierConfig,
) -> Result<std::sync::Arc<dyn ImageClassifier>, ClassifierError> {
    Ok(std::sync::Arc::new(OnnxClassifier::load(config)?))
}

#[cfg(not(feature = "onnx"))]
pub fn load_classifier(
    config: &ClassifierConfig,
) -> Result<std::sync::Arc<dyn ImageClassifier>, ClassifierError> {
    Err(ClassifierError::ModelLoad(format!(
        "cannot load {}: built without the `onnx` feature",
        config.model_path.display()
    )))
}
