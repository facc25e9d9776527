//! Threshold-gated evidence retrieval
//!
//! Turns one claim into a bounded evidence set:
//! 1. Over-fetch `2 * top_k` candidates from the vector index
//! 2. Keep candidates with similarity >= threshold
//! 3. If none survive but the index returned something, fall back to the
//!    unfiltered top 2 so the verifier still sees the nearest evidence
//! 4. Truncate to `top_k`, preserving similarity order
//!
//! The fallback runs at most once and never retries at a looser threshold.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::embeddings::EmbeddingProvider;
use crate::error::{FactCheckError, Result};
use crate::search::{
    RetrievalCandidate, VectorIndex, DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TOP_K,
    FALLBACK_CANDIDATES,
};

/// Candidate selection parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum number of candidates returned
    pub top_k: usize,
    /// Minimum cosine similarity for a candidate to pass the filter
    pub similarity_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl RetrievalConfig {
    pub fn new(top_k: usize, similarity_threshold: f32) -> Result<Self> {
        let config = Self {
            top_k,
            similarity_threshold,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(FactCheckError::Config(
                "top_k must be a positive integer".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(FactCheckError::Config(format!(
                "similarity_threshold must be within [0, 1], got {}",
                self.similarity_threshold
            )));
        }

        Ok(())
    }
}

/// Select evidence for a claim embedding under the threshold-with-fallback
/// policy.
pub fn select_evidence(
    index: &VectorIndex,
    claim_embedding: &[f32],
    config: &RetrievalConfig,
) -> Result<Vec<RetrievalCandidate>> {
    config.validate()?;

    let initial = index.search(claim_embedding, config.top_k.saturating_mul(2))?;

    let mut selected: Vec<RetrievalCandidate> = initial
        .iter()
        .filter(|candidate| candidate.similarity >= config.similarity_threshold)
        .cloned()
        .collect();

    if selected.is_empty() {
        if let Some(nearest) = initial.first() {
            tracing::warn!(
                "No candidate reached threshold {:.3}; using lower similarity results (best {:.3})",
                config.similarity_threshold,
                nearest.similarity
            );
            selected = initial.into_iter().take(FALLBACK_CANDIDATES).collect();
        }
    }

    selected.truncate(config.top_k);

    tracing::debug!("Selected {} evidence candidates", selected.len());
    Ok(selected)
}

/// Retrieval front-end over a shared index and an embedding provider
#[derive(Clone)]
pub struct EvidenceRetriever {
    index: Arc<RwLock<VectorIndex>>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: RetrievalConfig,
}

impl EvidenceRetriever {
    pub fn new(
        index: Arc<RwLock<VectorIndex>>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: RetrievalConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            index,
            embedder,
            config,
        })
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn index(&self) -> &Arc<RwLock<VectorIndex>> {
        &self.index
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Embed `claim` and retrieve evidence with the configured parameters.
    pub async fn retrieve_for_claim(&self, claim: &str) -> Result<Vec<RetrievalCandidate>> {
        let embedding = self.embedder.embed(claim)?;
        self.retrieve(&embedding, self.config.top_k, self.config.similarity_threshold)
            .await
    }

    /// Retrieve evidence for a precomputed claim embedding.
    pub async fn retrieve(
        &self,
        claim_embedding: &[f32],
        top_k: usize,
        similarity_threshold: f32,
    ) -> Result<Vec<RetrievalCandidate>> {
        let config = RetrievalConfig::new(top_k, similarity_threshold)?;
        let index = self.index.read().await;
        select_evidence(&index, claim_embedding, &config)
    }
}
