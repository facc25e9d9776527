//! Offline corpus loading and index building
//!
//! The corpus is a JSON Lines file, one press release per line:
//! `{"content": "...", "source": "...", "title": "...", "external_id": "...", "published_at": "..."}`
//! Only `content` is required.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::{DocumentRecord, NewDocument};
use crate::embeddings::EmbeddingProvider;
use crate::error::{FactCheckError, Result};
use crate::search::VectorIndex;

pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Read corpus documents from a JSON Lines file. Blank lines are skipped.
pub fn load_documents(path: &Path) -> Result<Vec<NewDocument>> {
    let file = File::open(path).map_err(|e| {
        FactCheckError::Corpus(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let mut documents = Vec::new();
    for (line_idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let line_no = line_idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let document: NewDocument = serde_json::from_str(&line)
            .map_err(|e| FactCheckError::Corpus(format!("line {}: {}", line_no, e)))?;

        if document.content.trim().is_empty() {
            return Err(FactCheckError::Corpus(format!(
                "line {}: document has no content",
                line_no
            )));
        }

        documents.push(document);
    }

    tracing::info!("Loaded {} documents from {}", documents.len(), path.display());
    Ok(documents)
}

/// Embed `documents` in batches and build a fresh index.
///
/// Either every document is indexed or the call fails and nothing is built.
pub fn build_index(
    documents: Vec<NewDocument>,
    embedder: &dyn EmbeddingProvider,
    batch_size: usize,
) -> Result<VectorIndex> {
    if batch_size == 0 {
        return Err(FactCheckError::Config(
            "batch_size must be a positive integer".to_string(),
        ));
    }

    let mut index = VectorIndex::create(embedder.dimension())?;
    if documents.is_empty() {
        tracing::warn!("Corpus is empty; built an empty index");
        return Ok(index);
    }

    let texts: Vec<String> = documents.iter().map(NewDocument::indexed_text).collect();
    let mut vectors = Vec::with_capacity(texts.len());

    for chunk in texts.chunks(batch_size) {
        let batch: Vec<&str> = chunk.iter().map(String::as_str).collect();
        vectors.extend(embedder.embed_batch(&batch)?);
        tracing::info!("Processed {}/{} documents", vectors.len(), texts.len());
    }

    index.insert_batch(vectors, documents)?;

    let stats = index.stats();
    tracing::info!(
        "Built index: {} documents, dimension {}",
        stats.count,
        stats.dimension
    );
    Ok(index)
}

/// Document count for one source label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCount {
    pub source: String,
    pub count: usize,
}

/// Per-source document counts, most frequent first, ties by name.
pub fn source_distribution(records: &[DocumentRecord]) -> Vec<SourceCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.source.as_str()).or_default() += 1;
    }

    let mut distribution: Vec<SourceCount> = counts
        .into_iter()
        .map(|(source, count)| SourceCount {
            source: source.to_string(),
            count,
        })
        .collect();

    // Stable sort keeps the BTreeMap's name order among equal counts
    distribution.sort_by(|a, b| b.count.cmp(&a.count));
    distribution
}
