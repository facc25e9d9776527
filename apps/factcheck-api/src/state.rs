//! Application state for the fact-check API
//!
//! One `FactChecker` handle is built at startup and shared with every request.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use factcheck_core::embeddings::load_provider;
use factcheck_core::{
    load_index, ClaimVerifier, FactCheckConfig, FactChecker, LlmVerifier, RuleBasedExtractor,
    VectorIndex,
};
use tracing::{info, warn};

/// Shared application state
pub struct AppState {
    pub checker: FactChecker,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(checker: FactChecker) -> Self {
        Self {
            checker,
            started_at: Utc::now(),
        }
    }

    /// Build the pipeline from configuration: load the index snapshot,
    /// select the embedder and connect the reasoning service.
    pub fn from_config(config: FactCheckConfig) -> Result<Self> {
        let embedder = load_provider(&config)?;

        let index = if config.index_path.exists() {
            load_index(&config.index_path)
                .with_context(|| format!("loading index {}", config.index_path.display()))?
        } else {
            warn!(
                "No index at {}; serving an empty index until one is built",
                config.index_path.display()
            );
            VectorIndex::create(embedder.dimension())?
        };

        let verifier: Arc<dyn ClaimVerifier> = Arc::new(LlmVerifier::from_config(&config)?);
        info!("Reasoning model: {}", config.llm.model);

        let checker = FactChecker::new(
            config,
            index,
            embedder,
            Arc::new(RuleBasedExtractor::new()),
            verifier,
        )?;

        Ok(Self::new(checker))
    }
}
