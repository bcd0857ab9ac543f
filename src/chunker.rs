//! Sliding-window document chunker.
//!
//! Splits raw document text into overlapping fixed-size windows before
//! indexing. Deterministic, pure function of (text, size, overlap).

use crate::config::ChunkingConfig;
use crate::errors::{RagError, Result};

/// A bounded text span cut from a document, the unit of embedding and
/// retrieval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Window text
    pub text: String,
    /// Start offset of the window in characters
    pub start_offset: usize,
}

/// Sliding-window chunker with a fixed size and overlap
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a chunker, validating that the overlap is strictly smaller
    /// than the window
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be positive".to_string()));
        }
        if overlap >= chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap {} must be smaller than chunk_size {}",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Create a chunker from the chunking section of the pipeline config
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Split text into windows of `chunk_size` characters advancing by
    /// `chunk_size - overlap`, starting at offset 0.
    ///
    /// Fully-blank windows are skipped. Degenerate input that produces no
    /// windows yields a single chunk holding the original text at offset 0.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        let stride = self.chunk_size - self.overlap;
        let mut chunks = Vec::new();

        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            let window: String = chars[start..end].iter().collect();
            if !window.trim().is_empty() {
                chunks.push(Chunk {
                    text: window,
                    start_offset: start,
                });
            }
            start += stride;
        }

        if chunks.is_empty() {
            chunks.push(Chunk {
                text: text.to_string(),
                start_offset: 0,
            });
        }

        chunks
    }

    /// Window size in characters
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap between consecutive windows in characters
    pub fn overlap(&self) -> usize {
        self.overlap
    }
}
