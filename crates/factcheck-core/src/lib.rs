//! Factcheck Core - retrieval and verdict aggregation for claim verification
//!
//! This crate provides:
//! - Document types and the append-only cosine `VectorIndex`
//! - Threshold-with-fallback evidence retrieval
//! - Collaborator traits: embeddings, claim extraction, claim verification
//! - Verdict aggregation and the `FactChecker` pipeline
//! - Snapshot persistence, corpus loading and configuration

pub mod aggregator;
pub mod checker;
pub mod config;
pub mod corpus;
pub mod document;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod llm;
pub mod search;
pub mod storage;
pub mod verifier;

// Re-export commonly used types
pub use aggregator::{AggregatedResult, PerClaimResult, VerdictAggregator};
pub use checker::FactChecker;
pub use config::{FactCheckConfig, LlmConfig};
pub use document::{DocumentRecord, Entity, NewDocument};
pub use embeddings::{EmbeddingProvider, HashingEmbedder};
pub use error::{FactCheckError, Result};
pub use extractor::{ClaimExtractor, RuleBasedExtractor};
pub use llm::LlmVerifier;
pub use search::{EvidenceRetriever, IndexStats, RetrievalCandidate, RetrievalConfig, VectorIndex};
pub use storage::{load_index, save_index, IndexSnapshot};
pub use verifier::{
    ClaimVerifier, Confidence, SemanticMatches, VerificationOutcome, Verdict, VerifierError,
};
