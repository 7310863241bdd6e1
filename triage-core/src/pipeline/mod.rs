pub mod prediction;
pub mod report;

pub use prediction::PredictionPipeline;
pub use report::ReportPipeline;

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::advisor::{Advisor, AdvisorRequest};
    use crate::classifier::ImageClassifier;
    use crate::error::{ClassifierError, OcrError, UpstreamError};
    use crate::models::{ClassificationResult, FileBlob};
    use crate::ocr::TextExtractor;

    pub struct StubClassifier {
        pub label: String,
        pub confidence: f64,
        pub calls: AtomicUsize,
    }

    impl StubClassifier {
        pub fn new(label: &str, confidence: f64) -> Self {
            Self {
                label: label.to_string(),
                confidence,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ImageClassifier for StubClassifier {
        fn classify(&self, _image: &DynamicImage) -> Result<ClassificationResult, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ClassificationResult {
                label: self.label.clone(),
                confidence: self.confidence,
            })
        }
    }

    /// Replies keyed on `max_tokens`, which differs per prompt shape.
    /// `None` simulates an upstream failure.
    #[derive(Default)]
    pub struct ScriptedAdvisor {
        pub urgency: Option<String>,
        pub narrative: Option<String>,
        pub structured: Option<String>,
        pub requests: Mutex<Vec<AdvisorRequest>>,
    }

    impl ScriptedAdvisor {
        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Advisor for ScriptedAdvisor {
        async fn query(&self, request: AdvisorRequest) -> Result<String, UpstreamError> {
            let reply = match request.max_tokens {
                10 => self.urgency.clone(),
                30 => self.narrative.clone(),
                _ => self.structured.clone(),
            };
            self.requests.lock().unwrap().push(request);
            reply.ok_or(UpstreamError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
    }

    pub struct StubOcr(pub Option<String>);

    #[async_trait]
    impl TextExtractor for StubOcr {
        async fn extract_text(&self, _blob: &FileBlob) -> Result<String, OcrError> {
            self.0
                .clone()
                .ok_or_else(|| OcrError::Decode("unreadable".to_string()))
        }
    }

    pub fn png_blob(name: &str) -> FileBlob {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, image::Rgb([120, 120, 120])));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        FileBlob::new(name, bytes)
    }
}
