//! On-disk persistence for the vector index
//!
//! An index is written as a single JSON snapshot holding the stored dimension,
//! the normalised vectors and the document records. Loading re-validates the
//! snapshot through [`VectorIndex::restore`].

use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::DocumentRecord;
use crate::error::Result;
use crate::search::VectorIndex;

/// Current snapshot layout version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized form of a [`VectorIndex`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub version: u32,
    pub dimension: usize,
    pub vectors: Vec<Vec<f32>>,
    pub records: Vec<DocumentRecord>,
}

/// Write the index to `path`, creating parent directories as needed.
///
/// The snapshot is written to a sibling temp file first and renamed into
/// place, so a crash mid-write never leaves a truncated index behind.
pub fn save_index(path: &Path, index: &VectorIndex) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("tmp");
    {
        let file = fs::File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &index.persist())?;
        writer.flush()?;
    }
    fs::rename(&tmp_path, path)?;

    tracing::info!(
        "Saved vector index with {} documents to {}",
        index.len(),
        path.display()
    );
    Ok(())
}

/// Read and validate an index previously written by [`save_index`].
pub fn load_index(path: &Path) -> Result<VectorIndex> {
    let file = fs::File::open(path)?;
    let snapshot: IndexSnapshot = serde_json::from_reader(BufReader::new(file))?;
    let index = VectorIndex::restore(snapshot)?;

    tracing::info!(
        "Loaded vector index with {} vectors, dimension {} from {}",
        index.len(),
        index.dimension(),
        path.display()
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::NewDocument;
    use crate::error::FactCheckError;

    fn sample_index() -> VectorIndex {
        let mut index = VectorIndex::create(3).unwrap();
        index
            .insert_batch(
                vec![vec![0.2, 0.4, 0.9], vec![1.0, -0.5, 0.1]],
                vec![
                    NewDocument::new("Heritage tourism by steam locomotive")
                        .with_source("Ministry of Railways"),
                    NewDocument::new("Funds released for drinking water"),
                ],
            )
            .unwrap();
        index
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vector_db").join("index.json");
        let index = sample_index();

        save_index(&path, &index).unwrap();
        let loaded = load_index(&path).unwrap();

        assert_eq!(loaded, index);
        assert_eq!(loaded.records()[1].source, "unknown");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_persist_is_deterministic() {
        let a = serde_json::to_string(&sample_index().persist()).unwrap();
        let b = serde_json::to_string(&sample_index().persist()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_index(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(FactCheckError::Io(_))));
    }

    #[test]
    fn test_load_corrupt_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        fs::write(
            &path,
            r#"{"version":1,"dimension":2,"vectors":[[1.0,0.0]],"records":[]}"#,
        )
        .unwrap();

        assert!(matches!(
            load_index(&path),
            Err(FactCheckError::CorruptSnapshot(_))
        ));
    }
}
