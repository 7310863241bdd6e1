pub mod advisor;
pub mod auth;
pub mod classifier;
pub mod config;
pub mod desk;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod humanize;
pub mod models;
pub mod ocr;
pub mod pipeline;
pub mod prompts;
pub mod storage;

// Re-export commonly used types
pub use advisor::{Advisor, AdvisorRequest, ChatCompletionAdvisor, TimeBudget};
pub use auth::{Authenticator, StaticTokenAuthenticator, bearer_token};
pub use classifier::{ImageClassifier, load_classifier};
pub use config::{AdvisorConfig, ClassifierConfig, TriageConfig};
pub use desk::TriageDesk;
pub use error::{
    ClassifierError, ConfigError, OcrError, Result, StorageError, TriageError, UpstreamError,
};
pub use models::{
    ClassificationResult, DiseaseCandidate, FileBlob, Finding, Medication, PredictionVerdict,
    ReportType, Severity, StructuredVerdict, SymptomSet, Urgency, UserId,
};
pub use ocr::{TextExtractor, VisionOcr};
pub use pipeline::{PredictionPipeline, ReportPipeline};
pub use storage::{
    CategoryEntry, InMemorySymptomCatalog, InMemoryVerdictStore, Page, PageRequest,
    PostgresSymptomCatalog, PostgresVerdictStore, PredictionRecord, PredictionStats,
    PredictionSummary, ReportRecord, SeedOutcome, Symptom, SymptomCatalog, SymptomListing,
    VerdictStore,
};
