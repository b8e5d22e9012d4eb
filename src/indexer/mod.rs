
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::chunker::TextChunker;
use crate::config::ChunkingConfig;
use crate::corpus::{ChunkMetadata, Corpus};
use crate::data::ComplaintRecord;
use crate::embeddings::Embedder;
use crate::{RagError, Result};

/// Builds a searchable corpus from complaint records: chunk every narrative,
/// embed the chunks in batches, and append vectors and metadata in the same
/// relative order so positions line up.
pub struct Indexer<'a> {
    chunker: TextChunker,
    embedder: &'a dyn Embedder,
}

impl<'a> Indexer<'a> {
    #[inline]
    pub fn new(chunking: ChunkingConfig, embedder: &'a dyn Embedder) -> Self {
        Self {
            chunker: TextChunker::new(chunking),
            embedder,
        }
    }

    /// Full build pass over all records. There is no partial update; a
    /// rebuild discards and recreates the whole corpus.
    #[inline]
    pub fn build(&self, records: &[ComplaintRecord]) -> Result<Corpus> {
        info!("Building corpus from {} complaint records", records.len());

        let progress = ProgressBar::new(records.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        progress.set_message("Chunking complaints");

        let mut texts = Vec::new();
        let mut metadata = Vec::new();

        for record in records {
            for chunk in self.chunker.split(&record.narrative) {
                metadata.push(ChunkMetadata {
                    complaint_id: record.complaint_id.clone(),
                    product: record.product.clone(),
                    market: record.market.clone(),
                    date: record.date.clone(),
                    channel: record.channel.clone(),
                    severity: record.severity.clone(),
                    raw_text: chunk.clone(),
                    raw_text_length: chunk.chars().count(),
                });
                texts.push(chunk);
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        if texts.is_empty() {
            return Err(RagError::Indexing(
                "No chunks produced from input records".to_string(),
            ));
        }

        debug!("Embedding {} chunks", texts.len());
        let vectors = self
            .embedder
            .embed_batch(&texts)
            .map_err(|e| RagError::Indexing(format!("Failed to embed chunks: {}", e)))?;

        if vectors.len() != texts.len() {
            return Err(RagError::Indexing(format!(
                "Embedding count mismatch: {} chunks vs {} vectors",
                texts.len(),
                vectors.len()
            )));
        }

        let dimension = vectors
            .first()
            .map(Vec::len)
            .ok_or_else(|| RagError::Indexing("Embedding provider returned no vectors".to_string()))?;

        let mut corpus = Corpus::new(dimension, self.embedder.model_id());
        corpus.append(&vectors, metadata)?;

        info!(
            "Built corpus: {} chunks, dimension {}, model {}",
            corpus.len(),
            dimension,
            corpus.embedding_model()
        );

        Ok(corpus)
    }
}
