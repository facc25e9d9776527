//! Configuration management for the fact-checking engine
//!
//! Values come from defaults overridden by environment variables; apps load a
//! `.env` file first and apply command-line flags last.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::embeddings::DEFAULT_EMBEDDING_DIM;
use crate::error::{FactCheckError, Result};
use crate::search::RetrievalConfig;

pub const DEFAULT_INDEX_PATH: &str = "data/vector_db/index.json";
pub const DEFAULT_MAX_CLAIMS: usize = 3;
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 1500;
pub const DEFAULT_VERIFIER_TIMEOUT_MS: u64 = 30_000;

/// Hugging Face repository fetched when the model directory is missing
pub const DEFAULT_MODEL_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";

pub const DEFAULT_LLM_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "llama-3.3-70b-versatile";

/// Reasoning service (OpenAI-compatible chat completions) settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Bearer token; the service cannot be called without one
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_LLM_API_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            temperature: 0.1,
            max_tokens: 800,
            top_p: 0.9,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactCheckConfig {
    pub retrieval: RetrievalConfig,
    pub embedding_dim: usize,
    /// Local sentence-transformers model directory; feature hashing is used
    /// when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,
    /// Hub repository used when `model_path` does not exist yet
    pub model_repo: String,
    pub index_path: PathBuf,
    /// Claims verified per input text; extra claims are dropped
    pub max_claims: usize,
    /// Evidence characters sent to the reasoning service per document
    pub max_content_length: usize,
    pub verifier_timeout_ms: u64,
    pub llm: LlmConfig,
}

impl Default for FactCheckConfig {
    fn default() -> Self {
        Self {
            retrieval: RetrievalConfig::default(),
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            model_path: None,
            model_repo: DEFAULT_MODEL_REPO.to_string(),
            index_path: PathBuf::from(DEFAULT_INDEX_PATH),
            max_claims: DEFAULT_MAX_CLAIMS,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            verifier_timeout_ms: DEFAULT_VERIFIER_TIMEOUT_MS,
            llm: LlmConfig::default(),
        }
    }
}

impl FactCheckConfig {
    /// Load configuration from environment variables
    ///
    /// Expected variables (all optional):
    /// - FACTCHECK_TOP_K, FACTCHECK_SIMILARITY_THRESHOLD
    /// - FACTCHECK_EMBEDDING_DIM, FACTCHECK_MODEL_PATH, FACTCHECK_MODEL_REPO
    /// - FACTCHECK_INDEX_PATH
    /// - FACTCHECK_MAX_CLAIMS, FACTCHECK_MAX_CONTENT_LENGTH
    /// - FACTCHECK_VERIFIER_TIMEOUT_MS
    /// - LLM_API_KEY (or GROQ_API_KEY), LLM_API_URL, LLM_MODEL
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            retrieval: RetrievalConfig {
                top_k: parse_var(&lookup, "FACTCHECK_TOP_K", defaults.retrieval.top_k)?,
                similarity_threshold: parse_var(
                    &lookup,
                    "FACTCHECK_SIMILARITY_THRESHOLD",
                    defaults.retrieval.similarity_threshold,
                )?,
            },
            embedding_dim: parse_var(&lookup, "FACTCHECK_EMBEDDING_DIM", defaults.embedding_dim)?,
            model_path: lookup("FACTCHECK_MODEL_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            model_repo: lookup("FACTCHECK_MODEL_REPO")
                .filter(|r| !r.trim().is_empty())
                .unwrap_or(defaults.model_repo),
            index_path: lookup("FACTCHECK_INDEX_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.index_path),
            max_claims: parse_var(&lookup, "FACTCHECK_MAX_CLAIMS", defaults.max_claims)?,
            max_content_length: parse_var(
                &lookup,
                "FACTCHECK_MAX_CONTENT_LENGTH",
                defaults.max_content_length,
            )?,
            verifier_timeout_ms: parse_var(
                &lookup,
                "FACTCHECK_VERIFIER_TIMEOUT_MS",
                defaults.verifier_timeout_ms,
            )?,
            llm: LlmConfig {
                api_key: lookup("LLM_API_KEY")
                    .or_else(|| lookup("GROQ_API_KEY"))
                    .filter(|key| !key.trim().is_empty()),
                base_url: lookup("LLM_API_URL").unwrap_or(defaults.llm.base_url),
                model: lookup("LLM_MODEL").unwrap_or(defaults.llm.model),
                ..defaults.llm
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.retrieval.validate()?;

        if self.embedding_dim == 0 {
            return Err(FactCheckError::Config(
                "embedding_dim must be a positive integer".to_string(),
            ));
        }

        if self.max_claims == 0 {
            return Err(FactCheckError::Config(
                "max_claims must be a positive integer".to_string(),
            ));
        }

        Ok(())
    }

    pub fn verifier_timeout(&self) -> Duration {
        Duration::from_millis(self.verifier_timeout_ms)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| {
            FactCheckError::Config(format!("{} has an invalid value: {:?}", key, raw))
        }),
        _ => Ok(default),
    }
}
