#[cfg(test)]
mod tests;

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::corpus::{ChunkMetadata, Corpus};
use crate::embeddings::Embedder;
use crate::{RagError, Result};

/// Attribute filters applied to retrieved chunks, e.g. `product -> "BNPL"`.
pub type Filters = HashMap<String, String>;

/// A chunk returned from a query. Transient, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub text: String,
    pub metadata: ChunkMetadata,
    /// Squared Euclidean distance to the query; lower is more relevant.
    pub score: f32,
}

/// Candidates fetched from the index per requested result, leaving room for
/// filter rejection. Under-fill after exhausting the over-fetched set is
/// accepted behavior, not retried.
const OVER_FETCH_FACTOR: usize = 2;

/// Embeds a question, searches the corpus index, and joins results against
/// the metadata store by position.
pub struct Retriever<'a> {
    corpus: &'a Corpus,
    embedder: &'a dyn Embedder,
}

impl<'a> Retriever<'a> {
    #[inline]
    pub fn new(corpus: &'a Corpus, embedder: &'a dyn Embedder) -> Self {
        Self { corpus, embedder }
    }

    /// Return up to `k` chunks, best relevance first. Returning fewer than
    /// `k` (because of filters or corpus size) is normal, never an error.
    #[inline]
    pub fn retrieve(
        &self,
        query: &str,
        k: usize,
        filters: &Filters,
    ) -> Result<Vec<RetrievedChunk>> {
        if k == 0 || self.corpus.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed_one(query)
            .map_err(|e| RagError::Retrieval(format!("Failed to embed query: {}", e)))?;

        let candidates = self
            .corpus
            .index()
            .search(&query_vector, k * OVER_FETCH_FACTOR)?;

        let mut chunks = Vec::with_capacity(k);

        for (position, distance) in candidates {
            let Some(metadata) = self.corpus.metadata(position) else {
                // Positional desync should be impossible after load-time
                // validation; skip rather than fail the whole query.
                warn!("Index position {} has no metadata record, skipping", position);
                continue;
            };

            if !matches_filters(metadata, filters) {
                continue;
            }

            chunks.push(RetrievedChunk {
                text: metadata.raw_text.clone(),
                metadata: metadata.clone(),
                score: distance,
            });

            if chunks.len() == k {
                break;
            }
        }

        debug!(
            "Retrieved {} of {} requested chunks for query",
            chunks.len(),
            k
        );

        Ok(chunks)
    }
}

/// Permissive filter match: a filter key the chunk's metadata does not carry
/// never excludes the chunk; only an explicit value mismatch does. This
/// trades precision for recall on sparsely-tagged corpora.
fn matches_filters(metadata: &ChunkMetadata, filters: &Filters) -> bool {
    filters.iter().all(|(key, expected)| {
        metadata
            .field(key)
            .is_none_or(|actual| actual == expected)
    })
}
