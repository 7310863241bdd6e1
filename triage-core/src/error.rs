use std::time::Duration;
use thiserror::Error;

/// Errors that terminate a triage request.
///
/// Upstream and OCR failures never appear here: the pipelines recover from
/// them with fallback verdicts.
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("authentication required")]
    AuthenticationRequired,

    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("classifier inference failed: {0}")]
    Inference(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl TriageError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        TriageError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<ClassifierError> for TriageError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::ModelLoad(msg) => TriageError::ModelLoad(msg),
            ClassifierError::Decode(msg) => TriageError::Decode(msg),
            ClassifierError::Inference(msg) => TriageError::Inference(msg),
        }
    }
}

/// Failures of the remote text-generation service.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("advisor returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("advisor call timed out after {0:?}")]
    Timeout(Duration),

    #[error("advisor network error: {0}")]
    Network(String),

    #[error("advisor response had no message content")]
    MissingContent,
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        UpstreamError::Network(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("{0}")]
    ModelLoad(String),

    #[error("{0}")]
    Decode(String),

    #[error("{0}")]
    Inference(String),
}

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR input is not a readable image: {0}")]
    Decode(String),

    #[error("OCR upstream failure: {0}")]
    Upstream(#[from] UpstreamError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("record rejected: {0}")]
    InvalidRecord(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

pub type Result<T> = std::result::Result<T, TriageError>;
