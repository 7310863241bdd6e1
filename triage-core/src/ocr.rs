//! Text extraction from uploaded report images.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use tracing::info;

use crate::advisor::{Advisor, AdvisorRequest, TimeBudget};
use crate::error::OcrError;
use crate::models::FileBlob;
use crate::prompts::OCR_PROMPT;

/// OCR collaborator. An empty string is a valid result.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, blob: &FileBlob) -> Result<String, OcrError>;
}

/// OCR through a vision-capable chat-completion model.
pub struct VisionOcr {
    advisor: Arc<dyn Advisor>,
    model: String,
}

impl VisionOcr {
    pub fn new(advisor: Arc<dyn Advisor>, model: impl Into<String>) -> Self {
        Self {
            advisor,
            model: model.into(),
        }
    }
}

#[async_trait]
impl TextExtractor for VisionOcr {
    async fn extract_text(&self, blob: &FileBlob) -> Result<String, OcrError> {
        let image =
            image::load_from_memory(&blob.bytes).map_err(|e| OcrError::Decode(e.to_string()))?;
        let encoded = image_to_base64(&image)?;

        let request = AdvisorRequest {
            system: String::new(),
            content: json!([
                { "type": "text", "text": OCR_PROMPT },
                {
                    "type": "image_url",
                    "image_url": { "url": format!("data:image/png;base64,{}", encoded) }
                }
            ]),
            temperature: 0.0,
            max_tokens: 4000,
            budget: TimeBudget::Long,
            model: Some(self.model.clone()),
        };

        let text = self.advisor.query(request).await?;
        info!(
            file = %blob.name,
            "Vision OCR extracted {} characters",
            text.len()
        );
        Ok(text)
    }
}

fn image_to_base64(image: &DynamicImage) -> Result<String, OcrError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| OcrError::Decode(format!("failed to encode image: {}", e)))?;
    Ok(STANDARD.encode(&buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpstreamError;
    use image::RgbImage;
    use std::sync::Mutex;

    struct RecordingAdvisor {
        reply: Result<String, u16>,
        seen: Mutex<Vec<AdvisorRequest>>,
    }

    #[async_trait]
    impl Advisor for RecordingAdvisor {
        async fn query(&self, request: AdvisorRequest) -> Result<String, UpstreamError> {
            self.seen.lock().unwrap().push(request);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(UpstreamError::Status {
                    status: *status,
                    body: String::new(),
                }),
            }
        }
    }

    fn png_blob() -> FileBlob {
        let image = DynamicImage::ImageRgb8(RgbImage::new(16, 16));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        FileBlob::new("report.png", bytes)
    }

    #[tokio::test]
    async fn test_sends_image_to_vision_model() {
        let advisor = Arc::new(RecordingAdvisor {
            reply: Ok("Hemoglobin 13.5 g/dL".to_string()),
            seen: Mutex::new(Vec::new()),
        });
        let ocr = VisionOcr::new(advisor.clone(), "vision-model");

        let text = ocr.extract_text(&png_blob()).await.unwrap();
        assert_eq!(text, "Hemoglobin 13.5 g/dL");

        let seen = advisor.seen.lock().unwrap();
        assert_eq!(seen[0].model.as_deref(), Some("vision-model"));
        let url = seen[0].content[1]["image_url"]["url"].as_str().unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_undecodable_blob_never_reaches_advisor() {
        let advisor = Arc::new(RecordingAdvisor {
            reply: Ok(String::new()),
            seen: Mutex::new(Vec::new()),
        });
        let ocr = VisionOcr::new(advisor.clone(), "vision-model");

        let err = ocr
            .extract_text(&FileBlob::new("report.pdf", b"%PDF-1.7".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::Decode(_)));
        assert!(advisor.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_surfaces_as_ocr_error() {
        let advisor = Arc::new(RecordingAdvisor {
            reply: Err(500),
            seen: Mutex::new(Vec::new()),
        });
        let err = VisionOcr::new(advisor, "vision-model")
            .extract_text(&png_blob())
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::Upstream(UpstreamError::Status { status: 500, .. })));
    }
}
