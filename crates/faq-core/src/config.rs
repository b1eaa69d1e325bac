//! Configuration types for the FAQ retrieval system.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{FaqError, Result};

/// Main configuration for the FAQ retrieval system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaqConfig {
    /// Chunking configuration.
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Ensemble (fusion) configuration.
    #[serde(default)]
    pub ensemble: EnsembleConfig,

    /// Lexical (BM25) retriever configuration.
    #[serde(default)]
    pub lexical: LexicalConfig,

    /// Vector retriever configuration.
    #[serde(default)]
    pub vector: VectorConfig,

    /// Multi-query retriever configuration.
    #[serde(default)]
    pub multi_query: MultiQueryConfig,
}

/// Character splitter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Separator the text is split on.
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Maximum characters per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters carried over between consecutive chunks.
    #[serde(default)]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            chunk_size: 300,
            chunk_overlap: 0,
        }
    }
}

/// Per-retriever fusion weights.
///
/// Every weight is explicit; nothing is derived as "the remainder".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetrieverWeights {
    /// Weight of the lexical (BM25) retriever.
    #[serde(default = "default_lexical_weight")]
    pub lexical: f64,

    /// Weight of the vector-similarity retriever.
    #[serde(default = "default_vector_weight")]
    pub vector: f64,

    /// Weight of the multi-query (LLM expansion) retriever.
    #[serde(default = "default_multi_query_weight")]
    pub multi_query: f64,
}

impl Default for RetrieverWeights {
    fn default() -> Self {
        Self {
            lexical: 0.3,
            vector: 0.5,
            multi_query: 0.2,
        }
    }
}

impl RetrieverWeights {
    /// Check that every weight is finite and non-negative and the sum is positive.
    pub fn validate(&self) -> Result<()> {
        validate_weights(&[
            ("lexical", self.lexical),
            ("vector", self.vector),
            ("multi_query", self.multi_query),
        ])
    }
}

/// Validate a set of named weights.
pub fn validate_weights(weights: &[(&str, f64)]) -> Result<()> {
    for (name, weight) in weights {
        if !weight.is_finite() || *weight < 0.0 {
            return Err(FaqError::config(format!(
                "weight for '{}' must be a finite non-negative number, got {}",
                name, weight
            )));
        }
    }

    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return Err(FaqError::config("retriever weights must sum to a positive value"));
    }

    Ok(())
}

/// Validate the rank-bias constant.
pub fn validate_rank_bias_constant(c: f64) -> Result<()> {
    if !c.is_finite() || c <= 0.0 {
        return Err(FaqError::config(format!(
            "rank-bias constant must be a finite positive number, got {}",
            c
        )));
    }
    Ok(())
}

/// Ensemble retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleConfig {
    /// Per-retriever weights.
    #[serde(default)]
    pub weights: RetrieverWeights,

    /// Rank-bias constant `c` in `w / (c + rank)`.
    #[serde(default = "default_rank_bias_constant")]
    pub rank_bias_constant: f64,

    /// Number of fused results to keep (None keeps all).
    #[serde(default = "default_limit")]
    pub limit: Option<usize>,

    /// Per-retriever timeout; a retriever that exceeds it contributes an empty list.
    #[serde(default)]
    pub retriever_timeout_ms: Option<u64>,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            weights: RetrieverWeights::default(),
            rank_bias_constant: 80.0,
            limit: Some(4),
            retriever_timeout_ms: None,
        }
    }
}

/// BM25 retriever configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexicalConfig {
    /// Number of documents returned per query.
    #[serde(default = "default_retriever_k")]
    pub k: usize,

    /// Term frequency saturation.
    #[serde(default = "default_k1")]
    pub k1: f64,

    /// Length normalization.
    #[serde(default = "default_b")]
    pub b: f64,
}

impl Default for LexicalConfig {
    fn default() -> Self {
        Self {
            k: 2,
            k1: 1.5,
            b: 0.75,
        }
    }
}

/// Vector retriever configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    /// Number of documents returned per query.
    #[serde(default = "default_retriever_k")]
    pub k: usize,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self { k: 2 }
    }
}

/// Multi-query retriever configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MultiQueryConfig {
    /// Also retrieve for the original question, not just generated ones.
    #[serde(default)]
    pub include_original: bool,
}

// Default value functions

fn default_separator() -> String {
    "\n\n".to_string()
}

fn default_chunk_size() -> usize {
    300
}

fn default_lexical_weight() -> f64 {
    0.3
}

fn default_vector_weight() -> f64 {
    0.5
}

fn default_multi_query_weight() -> f64 {
    0.2
}

fn default_rank_bias_constant() -> f64 {
    80.0
}

fn default_limit() -> Option<usize> {
    Some(4)
}

fn default_retriever_k() -> usize {
    2
}

fn default_k1() -> f64 {
    1.5
}

fn default_b() -> f64 {
    0.75
}

impl FaqConfig {
    /// Load configuration from file.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| FaqError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default paths.
    pub fn load_default() -> Result<Self> {
        // Try user config first
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("faq-rag").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        // Try local config
        let local_config = PathBuf::from("faq-rag.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        Ok(Self::default())
    }

    /// Validate values that cannot be expressed in the types.
    pub fn validate(&self) -> Result<()> {
        self.ensemble.weights.validate()?;
        validate_rank_bias_constant(self.ensemble.rank_bias_constant)?;

        if self.chunking.chunk_size == 0 {
            return Err(FaqError::config("chunk_size must be positive"));
        }
        if self.chunking.chunk_overlap > self.chunking.chunk_size {
            return Err(FaqError::config(format!(
                "chunk_overlap ({}) is larger than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = FaqConfig::default();
        assert_eq!(config.chunking.chunk_size, 300);
        assert_eq!(config.chunking.separator, "\n\n");
        assert_eq!(config.ensemble.rank_bias_constant, 80.0);
        assert_eq!(config.ensemble.limit, Some(4));
        assert_eq!(config.lexical.k, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_weights_validation() {
        let negative = RetrieverWeights {
            lexical: 0.7,
            vector: 0.5,
            multi_query: -0.2,
        };
        assert!(negative.validate().unwrap_err().is_config());

        let zero = RetrieverWeights {
            lexical: 0.0,
            vector: 0.0,
            multi_query: 0.0,
        };
        assert!(zero.validate().is_err());

        let nan = RetrieverWeights {
            lexical: f64::NAN,
            vector: 0.5,
            multi_query: 0.0,
        };
        assert!(nan.validate().is_err());

        // Weights need not sum to one.
        let unnormalized = RetrieverWeights {
            lexical: 3.0,
            vector: 5.0,
            multi_query: 0.0,
        };
        assert!(unnormalized.validate().is_ok());
    }

    #[test]
    fn test_rank_bias_constant_validation() {
        assert!(validate_rank_bias_constant(80.0).is_ok());
        assert!(validate_rank_bias_constant(0.5).is_ok());
        assert!(validate_rank_bias_constant(0.0).is_err());
        assert!(validate_rank_bias_constant(-1.0).is_err());
        assert!(validate_rank_bias_constant(f64::INFINITY).is_err());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[ensemble]
rank_bias_constant = 60.0
limit = 10

[ensemble.weights]
lexical = 0.5
vector = 0.5
multi_query = 0.0

[lexical]
k = 5
"#
        )
        .unwrap();

        let config = FaqConfig::load(file.path()).unwrap();
        assert_eq!(config.ensemble.rank_bias_constant, 60.0);
        assert_eq!(config.ensemble.limit, Some(10));
        assert_eq!(config.ensemble.weights.multi_query, 0.0);
        assert_eq!(config.lexical.k, 5);
        assert_eq!(config.lexical.k1, 1.5);
        assert_eq!(config.vector.k, 2);
        assert_eq!(config.chunking.chunk_size, 300);
    }

    #[test]
    fn test_load_rejects_invalid_constant() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ensemble]\nrank_bias_constant = 0.0").unwrap();

        let err = FaqConfig::load(file.path()).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_overlap_larger_than_size() {
        let mut config = FaqConfig::default();
        config.chunking.chunk_overlap = 400;
        assert!(config.validate().is_err());
    }
}
