//! Search module - exact vector search and threshold-gated evidence retrieval
//!
//! This module provides:
//! - `VectorIndex`: append-only, brute-force cosine similarity index
//! - `EvidenceRetriever`: threshold filtering with a nearest-neighbour fallback
//! - Query expansion hints for government press-release vocabulary

pub mod expansion;
pub mod retriever;
pub mod vector;

pub use expansion::expand_query_terms;
pub use retriever::{EvidenceRetriever, RetrievalConfig};
pub use vector::{IndexStats, VectorIndex};

use serde::{Deserialize, Serialize};

// Retrieval defaults
pub const DEFAULT_TOP_K: usize = 8;
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.6;

/// Number of unfiltered candidates kept when nothing clears the threshold.
pub const FALLBACK_CANDIDATES: usize = 2;

/// A document surfaced for one query. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalCandidate {
    pub document_id: u64,
    pub content: String,
    pub source: String,
    /// Cosine similarity in (0, 1]
    pub similarity: f32,
}
