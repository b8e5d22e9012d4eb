
use tracing::debug;

use crate::config::ChunkingConfig;

/// Splits a complaint narrative into overlapping fixed-size character windows.
///
/// Deterministic: the same input and configuration always produce the same
/// sequence. Windows are measured in characters, not bytes, so multi-byte
/// text is never split inside a code point.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// Overlap must be smaller than the chunk size; enforced by config
    /// validation before a chunker is built.
    #[inline]
    pub fn new(config: ChunkingConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }

    /// Split a narrative into chunks of at most `chunk_size` characters,
    /// consecutive chunks sharing `chunk_overlap` characters.
    ///
    /// Any non-empty input yields at least one chunk; input that fits in a
    /// single window is returned whole.
    #[inline]
    pub fn split(&self, narrative: &str) -> Vec<String> {
        if narrative.is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = narrative.chars().collect();
        if chars.len() <= self.chunk_size {
            return vec![narrative.to_string()];
        }

        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }

        debug!(
            "Split narrative of {} chars into {} chunks",
            chars.len(),
            chunks.len()
        );

        chunks
    }
}
