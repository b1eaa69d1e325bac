//! faq-chunk - Chunking strategies
//!
//! This crate splits source documents into chunks small enough to be
//! indexed and handed to a language model as context.
//!
//! # Chunkers
//!
//! - [`CharacterSplitter`]: Splits text on a single separator (paragraph
//!   breaks by default) and greedily merges the pieces back together up to a
//!   character budget, optionally carrying an overlap between chunks.
//!
//! # Example
//!
//! ```rust
//! use faq_chunk::{CharacterSplitter, Chunker};
//! use faq_core::ChunkingConfig;
//!
//! let splitter = CharacterSplitter::new();
//! let config = ChunkingConfig::default();
//! let chunks = splitter.split_text("Q: 営業時間は？\n\nA: 10時から20時です。", &config).unwrap();
//! assert_eq!(chunks.len(), 1);
//! ```

mod character;

pub use character::CharacterSplitter;

// Re-export types for convenience
pub use faq_core::{ChunkingConfig, Chunker};
