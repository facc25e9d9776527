//! Exact nearest-neighbour search by cosine similarity
//!
//! Vectors are L2-normalised on insert, so the inner product of a normalised
//! query with a stored vector is their cosine similarity. Search is a linear
//! scan over every stored vector, which keeps top-k exact and deterministic.
//!
//! # Layout
//!
//! Vectors live in one flat `Vec<f32>` (`count * dimension` floats) next to a
//! `Vec<DocumentRecord>`. Position `i` in the record list always corresponds to
//! the `i`-th chunk of the vector buffer; neither is exposed mutably.
//!
//! # Example
//!
//! ```rust
//! use factcheck_core::document::NewDocument;
//! use factcheck_core::search::VectorIndex;
//!
//! # fn main() -> factcheck_core::Result<()> {
//! let mut index = VectorIndex::create(3)?;
//! index.insert_batch(
//!     vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]],
//!     vec![NewDocument::new("first"), NewDocument::new("second")],
//! )?;
//!
//! let hits = index.search(&[2.0, 0.1, 0.0], 1)?;
//! assert_eq!(hits[0].document_id, 1);
//! # Ok(())
//! # }
//! ```

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::document::{DocumentRecord, NewDocument};
use crate::error::{FactCheckError, Result};
use crate::search::RetrievalCandidate;
use crate::storage::{IndexSnapshot, SNAPSHOT_VERSION};

/// Size/dimension introspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub count: usize,
    pub dimension: usize,
}

/// Append-only vector index with co-indexed document metadata
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    dimension: usize,
    vectors: Vec<f32>,
    records: Vec<DocumentRecord>,
}

impl VectorIndex {
    /// Create an empty index fixed to `dimension`.
    pub fn create(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(FactCheckError::Config(
                "index dimension must be positive".to_string(),
            ));
        }

        Ok(Self {
            dimension,
            vectors: Vec::new(),
            records: Vec::new(),
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            count: self.len(),
            dimension: self.dimension,
        }
    }

    /// Stored records in insertion order
    pub fn records(&self) -> &[DocumentRecord] {
        &self.records
    }

    /// Look up a record by its id
    pub fn get(&self, id: u64) -> Option<&DocumentRecord> {
        // ids are dense and 1-based
        let position = usize::try_from(id).ok()?.checked_sub(1)?;
        self.records.get(position)
    }

    /// Append a batch of vectors with their documents.
    ///
    /// The whole batch is validated before anything is stored: a count
    /// mismatch or a single vector of the wrong length rejects the batch and
    /// leaves the index untouched. Returns the ids assigned, in input order.
    pub fn insert_batch(
        &mut self,
        vectors: Vec<Vec<f32>>,
        documents: Vec<NewDocument>,
    ) -> Result<Vec<u64>> {
        if vectors.len() != documents.len() {
            return Err(FactCheckError::DimensionMismatch {
                expected: documents.len(),
                actual: vectors.len(),
            });
        }

        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(FactCheckError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            });
        }

        let first_id = self.records.len() as u64 + 1;
        self.vectors.reserve(vectors.len() * self.dimension);
        self.records.reserve(documents.len());

        let mut ids = Vec::with_capacity(documents.len());
        for (offset, (mut vector, document)) in vectors.into_iter().zip(documents).enumerate() {
            l2_normalize(&mut vector);
            self.vectors.extend_from_slice(&vector);

            let id = first_id + offset as u64;
            self.records.push(document.into_record(id));
            ids.push(id);
        }

        tracing::debug!("Inserted {} vectors, index size {}", ids.len(), self.len());
        Ok(ids)
    }

    /// Top-`k` records by cosine similarity to `query`.
    ///
    /// Results are ordered by similarity descending, ties broken by the lower
    /// (earlier) id. Only strictly positive similarities are returned. An
    /// empty index yields an empty result rather than an error.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievalCandidate>> {
        if query.len() != self.dimension {
            return Err(FactCheckError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        if k == 0 {
            return Err(FactCheckError::Config(
                "search k must be positive".to_string(),
            ));
        }

        if self.is_empty() {
            tracing::debug!("Search against empty index");
            return Ok(Vec::new());
        }

        let mut query = query.to_vec();
        l2_normalize(&mut query);

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, stored)| (position, dot(&query, stored)))
            .filter(|(_, similarity)| *similarity > 0.0)
            .collect();

        scored.sort_by(|a, b| match b.1.total_cmp(&a.1) {
            Ordering::Equal => a.0.cmp(&b.0),
            other => other,
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, similarity)| {
                let record = &self.records[position];
                RetrievalCandidate {
                    document_id: record.id,
                    content: record.content.clone(),
                    source: record.source.clone(),
                    similarity: similarity.min(1.0),
                }
            })
            .collect())
    }

    /// Serialize vectors and metadata. Identical insert histories produce
    /// identical snapshots.
    pub fn persist(&self) -> IndexSnapshot {
        IndexSnapshot {
            version: SNAPSHOT_VERSION,
            dimension: self.dimension,
            vectors: self
                .vectors
                .chunks_exact(self.dimension)
                .map(<[f32]>::to_vec)
                .collect(),
            records: self.records.clone(),
        }
    }

    /// Rebuild an index from a snapshot, re-validating its structure.
    pub fn restore(snapshot: IndexSnapshot) -> Result<Self> {
        let IndexSnapshot {
            version,
            dimension,
            vectors,
            records,
        } = snapshot;

        if version != SNAPSHOT_VERSION {
            return Err(FactCheckError::CorruptSnapshot(format!(
                "unsupported snapshot version {}",
                version
            )));
        }

        if dimension == 0 {
            return Err(FactCheckError::CorruptSnapshot(
                "stored dimension is zero".to_string(),
            ));
        }

        if vectors.len() != records.len() {
            return Err(FactCheckError::CorruptSnapshot(format!(
                "{} vectors but {} metadata records",
                vectors.len(),
                records.len()
            )));
        }

        if let Some((position, bad)) = vectors
            .iter()
            .enumerate()
            .find(|(_, v)| v.len() != dimension)
        {
            return Err(FactCheckError::CorruptSnapshot(format!(
                "vector {} has dimension {}, expected {}",
                position,
                bad.len(),
                dimension
            )));
        }

        if let Some((position, record)) = records
            .iter()
            .enumerate()
            .find(|(position, record)| record.id != *position as u64 + 1)
        {
            return Err(FactCheckError::CorruptSnapshot(format!(
                "record at position {} has id {}",
                position, record.id
            )));
        }

        Ok(Self {
            dimension,
            vectors: vectors.into_iter().flatten().collect(),
            records,
        })
    }
}

/// Normalise to unit length in place. Zero and non-finite vectors become zero.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm > 0.0 && norm.is_finite() {
        vector.iter_mut().for_each(|x| *x /= norm);
    } else {
        vector.iter_mut().for_each(|x| *x = 0.0);
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
