//! Typed configuration errors.
//!
//! Construction-time validation failures are reported through [`ConfigError`]
//! so callers can match on the specific precondition that was violated.
//! Runtime failures (driver, search) stay as [`anyhow::Error`] and propagate
//! unchanged.

use thiserror::Error;

/// A configuration precondition was violated.
///
/// Raised synchronously at construction, before any backend resource is
/// touched. Non-recoverable: the caller must fix the inputs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No search index name was supplied.
    #[error("index_name is required")]
    MissingIndexName,

    /// Vector or hybrid mode was requested without an embedder.
    #[error("embedder is required for index_type '{0}'")]
    EmbedderRequired(String),

    /// Hybrid mode was requested without a distinct fulltext index.
    #[error("fulltext_index_name is required for hybrid search")]
    MissingFulltextIndexName,

    /// The result-count limit is below the minimum.
    #[error("top_k must be at least 1, got {0}")]
    InvalidTopK(usize),

    /// A required connection setting is absent from both the constructor
    /// and the environment.
    #[error("{0} must be set")]
    MissingSetting(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_violated_precondition() {
        assert!(ConfigError::MissingIndexName.to_string().contains("index_name"));
        assert!(ConfigError::EmbedderRequired("vector".to_string())
            .to_string()
            .contains("embedder is required"));
        assert!(ConfigError::MissingFulltextIndexName
            .to_string()
            .contains("fulltext_index_name is required"));
        assert!(ConfigError::InvalidTopK(0)
            .to_string()
            .contains("top_k must be at least 1"));
        assert!(ConfigError::MissingSetting("NEO4J_URI")
            .to_string()
            .contains("NEO4J_URI"));
    }
}
