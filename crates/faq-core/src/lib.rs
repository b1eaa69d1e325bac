//! faq-core - Core types and traits for the FAQ retrieval system
//!
//! This crate provides the foundational types, collaborator traits, and error
//! handling used throughout the faq-rag workspace.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{FaqError, Result};
pub use traits::*;
pub use types::*;
