//! Runtime configuration, resolved once at startup and passed into services.

use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_ADVISOR_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_ADVISOR_MODEL: &str = "llama3-8b-8192";
pub const DEFAULT_OCR_MODEL: &str = "llama-3.2-11b-vision-preview";
pub const DEFAULT_INPUT_SIZE: u32 = 224;
pub const DEFAULT_PORT: u16 = 8000;

/// Credentials and endpoint of the remote advisor.
#[derive(Clone, Debug)]
pub struct AdvisorConfig {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    /// Vision-capable model used for OCR.
    pub ocr_model: String,
}

/// Classifier artefacts and preprocessing parameters.
#[derive(Clone, Debug)]
pub struct ClassifierConfig {
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub num_classes: usize,
    pub input_size: u32,
    pub normalize_mean: f32,
    pub normalize_std: f32,
}

#[derive(Clone, Debug)]
pub struct TriageConfig {
    pub port: u16,
    pub classifier: ClassifierConfig,
    /// `None` disables the advisor and OCR; every verdict then comes from fallbacks.
    pub advisor: Option<AdvisorConfig>,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Bearer token to user id pairs.
    pub api_tokens: Vec<(String, String)>,
}

impl TriageConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(raw) => parse(&raw, "PORT")?,
            None => DEFAULT_PORT,
        };

        let num_classes: usize = parse(
            &get("TRIAGE_NUM_CLASSES").ok_or(ConfigError::Missing("TRIAGE_NUM_CLASSES"))?,
            "TRIAGE_NUM_CLASSES",
        )?;
        if num_classes == 0 {
            return Err(ConfigError::Invalid {
                key: "TRIAGE_NUM_CLASSES",
                message: "must be at least 1".to_string(),
            });
        }

        let input_size: u32 = match get("TRIAGE_INPUT_SIZE") {
            Some(raw) => parse(&raw, "TRIAGE_INPUT_SIZE")?,
            None => DEFAULT_INPUT_SIZE,
        };
        if input_size == 0 {
            return Err(ConfigError::Invalid {
                key: "TRIAGE_INPUT_SIZE",
                message: "must be at least 1".to_string(),
            });
        }

        let normalize_std: f32 = match get("TRIAGE_NORMALIZE_STD") {
            Some(raw) => parse(&raw, "TRIAGE_NORMALIZE_STD")?,
            None => 1.0,
        };
        if normalize_std <= 0.0 {
            return Err(ConfigError::Invalid {
                key: "TRIAGE_NORMALIZE_STD",
                message: "must be positive".to_string(),
            });
        }

        let classifier = ClassifierConfig {
            model_path: get("TRIAGE_MODEL_PATH")
                .map(PathBuf::from)
                .ok_or(ConfigError::Missing("TRIAGE_MODEL_PATH"))?,
            labels_path: get("TRIAGE_LABELS_PATH")
                .map(PathBuf::from)
                .ok_or(ConfigError::Missing("TRIAGE_LABELS_PATH"))?,
            num_classes,
            input_size,
            normalize_mean: match get("TRIAGE_NORMALIZE_MEAN") {
                Some(raw) => parse(&raw, "TRIAGE_NORMALIZE_MEAN")?,
                None => 0.0,
            },
            normalize_std,
        };

        let advisor = get("GROQ_API_KEY").map(|api_key| AdvisorConfig {
            api_key,
            endpoint: get("TRIAGE_ADVISOR_URL").unwrap_or_else(|| DEFAULT_ADVISOR_URL.to_string()),
            model: get("TRIAGE_ADVISOR_MODEL")
                .unwrap_or_else(|| DEFAULT_ADVISOR_MODEL.to_string()),
            ocr_model: get("TRIAGE_OCR_MODEL").unwrap_or_else(|| DEFAULT_OCR_MODEL.to_string()),
        });

        let api_tokens = match get("TRIAGE_API_TOKENS") {
            Some(raw) => parse_token_pairs(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            port,
            classifier,
            advisor,
            database_url: get("DATABASE_URL"),
            api_tokens,
        })
    }
}

fn parse<T>(raw: &str, key: &'static str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        message: format!("{:?}: {}", raw, e),
    })
}

/// Parses `token=user,token=user`.
fn parse_token_pairs(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((token, user)) if !token.trim().is_empty() && !user.trim().is_empty() => {
                Ok((token.trim().to_string(), user.trim().to_string()))
            }
            _ => Err(ConfigError::Invalid {
                key: "TRIAGE_API_TOKENS",
                message: format!("expected token=user, got {:?}", pair),
            }),
        })
        .collect()
}
