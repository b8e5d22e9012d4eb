// Embedding provider abstraction and the Ollama-backed implementation.

pub mod ollama;

use anyhow::Result;

pub use ollama::EmbeddingClient;

/// Maps text to fixed-dimension vectors.
///
/// The same model identity must be used when building a corpus and when
/// embedding queries against it; the corpus records the identity and load
/// fails fast on a mismatch.
pub trait Embedder {
    /// Embed a batch of texts, order-preserving: vector `i` corresponds to
    /// `texts[i]`.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(std::slice::from_ref(&text.to_string()))?;
        vectors
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Embedding provider returned no vector"))
    }

    /// Identity of the backing model.
    fn model_id(&self) -> &str;
}
