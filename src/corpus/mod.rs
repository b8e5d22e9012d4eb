
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::index::FlatIndex;
use crate::{RagError, Result};

/// Per-chunk record, positionally aligned with the vector index: the record
/// at position `i` describes the vector at position `i`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    pub complaint_id: String,
    pub product: Option<String>,
    pub market: Option<String>,
    pub date: Option<String>,
    pub channel: Option<String>,
    pub severity: Option<String>,
    pub raw_text: String,
    pub raw_text_length: usize,
}

impl ChunkMetadata {
    /// Look up a filterable attribute by name. Returns `None` when the field
    /// is unknown or unset for this chunk.
    #[inline]
    pub fn field(&self, key: &str) -> Option<&str> {
        match key {
            "complaint_id" => Some(self.complaint_id.as_str()),
            "product" => self.product.as_deref(),
            "market" => self.market.as_deref(),
            "date" => self.date.as_deref(),
            "channel" => self.channel.as_deref(),
            "severity" => self.severity.as_deref(),
            _ => None,
        }
    }
}

/// Serialized form of the metadata artifact. Carries the embedding model
/// identity so a corpus built with one model cannot silently be queried
/// with another.
#[derive(Debug, Serialize, Deserialize)]
struct MetadataFile {
    embedding_model: String,
    records: Vec<ChunkMetadata>,
}

/// The persisted unit: a vector index and its positionally-aligned metadata.
/// Built whole, replaced whole; read-only between rebuilds.
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    index: FlatIndex,
    metadata: Vec<ChunkMetadata>,
    embedding_model: String,
}

impl Corpus {
    #[inline]
    pub fn new(dimension: usize, embedding_model: &str) -> Self {
        Self {
            index: FlatIndex::new(dimension),
            metadata: Vec::new(),
            embedding_model: embedding_model.to_string(),
        }
    }

    /// Append aligned (vector, metadata) pairs. The caller must supply them
    /// in the same relative order; this is what maintains the positional
    /// invariant.
    #[inline]
    pub fn append(&mut self, vectors: &[Vec<f32>], records: Vec<ChunkMetadata>) -> Result<()> {
        if vectors.len() != records.len() {
            return Err(RagError::Indexing(format!(
                "Vector/metadata count mismatch: {} vs {}",
                vectors.len(),
                records.len()
            )));
        }
        self.index.add(vectors)?;
        self.metadata.extend(records);
        Ok(())
    }

    #[inline]
    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    #[inline]
    pub fn metadata(&self, position: usize) -> Option<&ChunkMetadata> {
        self.metadata.get(position)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    #[inline]
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Persist both artifacts under one path prefix.
    ///
    /// Both files are written to temporary paths first and renamed into place
    /// only after both writes succeed, so a half-written corpus is never left
    /// behind where `load` would accept it.
    #[inline]
    pub fn save(&self, index_path: &Path, metadata_path: &Path) -> Result<()> {
        if self.index.len() != self.metadata.len() {
            return Err(RagError::Indexing(format!(
                "Refusing to save desynced corpus: {} vectors vs {} metadata records",
                self.index.len(),
                self.metadata.len()
            )));
        }

        for path in [index_path, metadata_path] {
            let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
            if let Some(parent) = parent {
                fs::create_dir_all(parent).map_err(|e| {
                    RagError::Indexing(format!(
                        "Failed to create directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let index_tmp = tmp_path(index_path);
        let metadata_tmp = tmp_path(metadata_path);

        let index_json = serde_json::to_string(&self.index)
            .map_err(|e| RagError::Indexing(format!("Failed to serialize index: {}", e)))?;
        let metadata_json = serde_json::to_string(&MetadataFile {
            embedding_model: self.embedding_model.clone(),
            records: self.metadata.clone(),
        })
        .map_err(|e| RagError::Indexing(format!("Failed to serialize metadata: {}", e)))?;

        write_file(&index_tmp, &index_json)?;
        if let Err(e) = write_file(&metadata_tmp, &metadata_json) {
            let _ = fs::remove_file(&index_tmp);
            return Err(e);
        }

        rename_file(&index_tmp, index_path)?;
        rename_file(&metadata_tmp, metadata_path)?;

        info!(
            "Saved corpus: {} chunks to {} and {}",
            self.metadata.len(),
            index_path.display(),
            metadata_path.display()
        );
        Ok(())
    }

    /// Load both artifacts back and verify the positional invariant and the
    /// embedding model identity before returning a usable corpus.
    #[inline]
    pub fn load(index_path: &Path, metadata_path: &Path, expected_model: &str) -> Result<Self> {
        let index_json = fs::read_to_string(index_path).map_err(|e| {
            RagError::Indexing(format!("Failed to read {}: {}", index_path.display(), e))
        })?;
        let metadata_json = fs::read_to_string(metadata_path).map_err(|e| {
            RagError::Indexing(format!("Failed to read {}: {}", metadata_path.display(), e))
        })?;

        let index: FlatIndex = serde_json::from_str(&index_json)
            .map_err(|e| RagError::Indexing(format!("Failed to parse index artifact: {}", e)))?;
        let metadata_file: MetadataFile = serde_json::from_str(&metadata_json)
            .map_err(|e| RagError::Indexing(format!("Failed to parse metadata artifact: {}", e)))?;

        if index.len() != metadata_file.records.len() {
            return Err(RagError::Indexing(format!(
                "Corpus desync: {} vectors vs {} metadata records",
                index.len(),
                metadata_file.records.len()
            )));
        }

        if metadata_file.embedding_model != expected_model {
            return Err(RagError::Indexing(format!(
                "Corpus was built with embedding model '{}' but '{}' is configured; rebuild the index",
                metadata_file.embedding_model, expected_model
            )));
        }

        debug!(
            "Loaded corpus: {} chunks, model {}",
            metadata_file.records.len(),
            metadata_file.embedding_model
        );

        Ok(Self {
            index,
            metadata: metadata_file.records,
            embedding_model: metadata_file.embedding_model,
        })
    }

    /// Whether both persisted artifacts exist. Absence of either means
    /// "no corpus yet" and triggers a build.
    #[inline]
    pub fn exists(index_path: &Path, metadata_path: &Path) -> bool {
        index_path.exists() && metadata_path.exists()
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
    name.push_str(".tmp");
    path.with_file_name(name)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents)
        .map_err(|e| RagError::Indexing(format!("Failed to write {}: {}", path.display(), e)))
}

fn rename_file(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(|e| {
        RagError::Indexing(format!(
            "Failed to move {} into place: {}",
            to.display(),
            e
        ))
    })
}
