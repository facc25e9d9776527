//! Embedding providers
//!
//! The engine only relies on [`EmbeddingProvider`]: deterministic output and a
//! fixed dimension that must match the vector index. Two providers ship here:
//! - [`HashingEmbedder`]: dependency-free feature hashing, used offline and in tests
//! - `BertEmbedder` (feature `candle`): sentence-transformers MiniLM on Candle

#[cfg(feature = "candle")]
pub mod bert;

#[cfg(feature = "candle")]
pub use bert::BertEmbedder;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use lazy_static::lazy_static;
use sha2::{Digest, Sha256};

use crate::config::FactCheckConfig;
use crate::error::Result;
use crate::search::vector::l2_normalize;

/// Dimension of all-MiniLM-L6-v2, the reference sentence embedding model
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Maps text to a fixed-dimension float vector
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving order
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Output dimension, fixed per provider instance
    fn dimension(&self) -> usize;

    /// Get the name of this provider
    fn name(&self) -> &str;
}

lazy_static! {
    static ref STOP_WORDS: HashSet<&'static str> = [
        "a", "an", "and", "are", "as", "at", "be", "been", "by", "for", "from", "has",
        "have", "had", "in", "is", "it", "its", "of", "on", "or", "that", "the", "their",
        "this", "to", "was", "were", "which", "with",
    ]
    .into_iter()
    .collect();
}

/// Bag-of-words feature hashing embedder.
///
/// Tokens are lower-cased alphanumeric runs with stop words dropped and a
/// trailing plural `s` folded away. Each token increments one bucket chosen
/// by its SHA-256 digest; the result is L2-normalised.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(bytes) % self.dimension as u64) as usize
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIM)
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in tokenize(text) {
            vector[self.bucket(&token)] += 1.0;
        }
        l2_normalize(&mut vector);
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

/// Where the configured embedding model comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// No model directory configured: feature hashing
    Hashing,
    /// Existing local model directory
    Local(PathBuf),
    /// Model directory configured but missing: fetch this Hub repository
    Hub(String),
}

/// Decide the model source for `config`, without loading anything.
pub fn model_source(config: &FactCheckConfig) -> ModelSource {
    match &config.model_path {
        None => ModelSource::Hashing,
        Some(path) if path.exists() => ModelSource::Local(path.clone()),
        Some(_) => ModelSource::Hub(config.model_repo.clone()),
    }
}

/// Embedding provider selected by configuration: the Candle model when a
/// model directory is configured and the `candle` feature is enabled,
/// feature hashing otherwise. A configured directory that does not exist is
/// filled from the Hugging Face Hub.
pub fn load_provider(config: &FactCheckConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match model_source(config) {
        ModelSource::Hashing => Ok(hashing_provider(config)),
        source => load_model(source, config),
    }
}

#[cfg(feature = "candle")]
fn load_model(source: ModelSource, config: &FactCheckConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    use crate::error::FactCheckError;

    let dir = match source {
        ModelSource::Hashing => return Ok(hashing_provider(config)),
        ModelSource::Local(dir) => dir,
        ModelSource::Hub(repo) => BertEmbedder::download(&repo)
            .map_err(|e| FactCheckError::Embedding(format!("downloading {}: {}", repo, e)))?,
    };

    let model = BertEmbedder::load(&dir).map_err(|e| FactCheckError::Embedding(e.to_string()))?;
    Ok(Arc::new(model))
}

#[cfg(not(feature = "candle"))]
fn load_model(source: ModelSource, config: &FactCheckConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    tracing::warn!(
        "Embedding model {:?} ignored: built without the `candle` feature",
        source
    );
    Ok(hashing_provider(config))
}

fn hashing_provider(config: &FactCheckConfig) -> Arc<dyn EmbeddingProvider> {
    tracing::info!("Using feature-hashing embedder, dimension {}", config.embedding_dim);
    Arc::new(HashingEmbedder::new(config.embedding_dim))
}

/// Normalised content tokens of `text`
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|raw| !raw.is_empty())
        .map(str::to_lowercase)
        .filter(|token| !STOP_WORDS.contains(token.as_str()))
        .map(fold_plural)
        .collect()
}

fn fold_plural(token: String) -> String {
    if token.chars().count() > 3 && token.ends_with('s') && !token.ends_with("ss") {
        token[..token.len() - 1].to_string()
    } else {
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_tokenize_drops_stop_words_and_folds_plurals() {
        assert_eq!(
            tokenize("Indian Railways have steam locomotives for tourism"),
            vec!["indian", "railway", "steam", "locomotive", "tourism"]
        );
        assert_eq!(tokenize("Business class"), vec!["business", "class"]);
    }

    #[test]
    fn test_embedding_is_deterministic_and_normalised() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed("Rural drinking water supply for Assam").unwrap();
        let b = embedder.embed("Rural drinking water supply for Assam").unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_EMBEDDING_DIM);
        assert!((cosine(&a, &a) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_text_embeds_to_zero_vector() {
        let embedder = HashingEmbedder::new(16);
        let v = embedder.embed("  the of  ").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_related_texts_are_similar() {
        let embedder = HashingEmbedder::default();
        let doc = embedder
            .embed("Railways earmarked heritage tourism by steam locomotive")
            .unwrap();
        let claim = embedder
            .embed("Indian Railways have steam locomotives for tourism")
            .unwrap();
        let unrelated = embedder
            .embed("Farmers receive free electricity from July")
            .unwrap();

        assert!(cosine(&doc, &claim) >= 0.6);
        assert!(cosine(&doc, &claim) > cosine(&doc, &unrelated));
    }

    #[test]
    fn test_load_provider_defaults_to_hashing() {
        let config = FactCheckConfig {
            embedding_dim: 48,
            ..FactCheckConfig::default()
        };
        let provider = load_provider(&config).unwrap();
        assert_eq!(provider.name(), "hashing");
        assert_eq!(provider.dimension(), 48);
    }

    #[test]
    fn test_model_source_decision() {
        let mut config = FactCheckConfig::default();
        assert_eq!(model_source(&config), ModelSource::Hashing);

        let dir = tempfile::tempdir().unwrap();
        config.model_path = Some(dir.path().to_path_buf());
        assert_eq!(
            model_source(&config),
            ModelSource::Local(dir.path().to_path_buf())
        );

        config.model_path = Some(dir.path().join("all-MiniLM-L6-v2"));
        config.model_repo = "sentence-transformers/all-MiniLM-L6-v2".to_string();
        assert_eq!(
            model_source(&config),
            ModelSource::Hub("sentence-transformers/all-MiniLM-L6-v2".to_string())
        );
    }

    #[cfg(not(feature = "candle"))]
    #[test]
    fn test_configured_model_falls_back_to_hashing_without_candle() {
        let config = FactCheckConfig {
            model_path: Some(PathBuf::from("/nonexistent/model")),
            embedding_dim: 24,
            ..FactCheckConfig::default()
        };
        let provider = load_provider(&config).unwrap();
        assert_eq!(provider.name(), "hashing");
        assert_eq!(provider.dimension(), 24);
    }

    #[test]
    fn test_batch_matches_single() {
        let embedder = HashingEmbedder::new(32);
        let batch = embedder.embed_batch(&["steel plant", "water supply"]).unwrap();
        assert_eq!(batch[1], embedder.embed("water supply").unwrap());
    }
}
