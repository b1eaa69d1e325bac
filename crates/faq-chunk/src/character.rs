//! Separator-based character splitter.
//!
//! Splits text on one separator, then merges the pieces back together until
//! the chunk budget is reached.

use std::collections::VecDeque;

use faq_core::{Chunker, ChunkingConfig, FaqError, Result};
use tracing::warn;

/// Splitter that cuts on a fixed separator and merges pieces up to
/// `chunk_size` characters.
///
/// A piece that is longer than `chunk_size` on its own is kept as an
/// oversized chunk rather than being cut mid-sentence.
pub struct CharacterSplitter {
    /// Function measuring chunk length.
    /// Counts Unicode scalar values if None.
    length_function: Option<Box<dyn Fn(&str) -> usize + Send + Sync>>,
}

impl CharacterSplitter {
    /// Create a splitter that measures length in characters.
    pub fn new() -> Self {
        Self {
            length_function: None,
        }
    }

    /// Create a splitter with a custom length function.
    pub fn with_length_function<F>(length: F) -> Self
    where
        F: Fn(&str) -> usize + Send + Sync + 'static,
    {
        Self {
            length_function: Some(Box::new(length)),
        }
    }

    fn length(&self, text: &str) -> usize {
        match &self.length_function {
            Some(length) => length(text),
            None => text.chars().count(),
        }
    }

    /// Join pieces with the separator, returning None for blank chunks.
    fn join(pieces: &VecDeque<&str>, separator: &str) -> Option<String> {
        let joined = pieces.iter().copied().collect::<Vec<_>>().join(separator);
        let trimmed = joined.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Greedily merge pieces into chunks of at most `chunk_size`.
    fn merge(&self, pieces: &[&str], config: &ChunkingConfig) -> Vec<String> {
        let separator = config.separator.as_str();
        let sep_len = self.length(separator);

        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let piece_len = self.length(piece);
            let joiner = if current.is_empty() { 0 } else { sep_len };

            if total + piece_len + joiner > config.chunk_size {
                if total > config.chunk_size {
                    warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total, config.chunk_size
                    );
                }

                if !current.is_empty() {
                    if let Some(chunk) = Self::join(&current, separator) {
                        chunks.push(chunk);
                    }

                    // Drop leading pieces until only the overlap is carried over
                    // and the next piece fits.
                    loop {
                        let joiner = if current.is_empty() { 0 } else { sep_len };
                        let too_long = total > 0 && total + piece_len + joiner > config.chunk_size;
                        if total <= config.chunk_overlap && !too_long {
                            break;
                        }

                        let Some(first) = current.pop_front() else {
                            break;
                        };
                        let joined = if current.is_empty() { 0 } else { sep_len };
                        total = total.saturating_sub(self.length(first) + joined);
                    }
                }
            }

            current.push_back(piece);
            total += piece_len;
            if current.len() > 1 {
                total += sep_len;
            }
        }

        if total > config.chunk_size {
            warn!(
                "Created a chunk of size {}, which is longer than the specified {}",
                total, config.chunk_size
            );
        }
        if let Some(chunk) = Self::join(&current, separator) {
            chunks.push(chunk);
        }

        chunks
    }
}

impl Default for CharacterSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker for CharacterSplitter {
    fn split_text(&self, text: &str, config: &ChunkingConfig) -> Result<Vec<String>> {
        if config.chunk_overlap > config.chunk_size {
            return Err(FaqError::chunking(format!(
                "chunk_overlap ({}) is larger than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }

        if text.is_empty() {
            return Ok(Vec::new());
        }

        let pieces: Vec<&str> = if config.separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(config.separator.as_str())
                .filter(|s| !s.is_empty())
                .collect()
        };

        Ok(self.merge(&pieces, config))
    }
}
