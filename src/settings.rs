//! Connection settings for the Neo4j backend.
//!
//! Settings are sourced from the environment (`NEO4J_*` variables) with
//! explicit constructor values always taking precedence. Index name defaults
//! match the ingestion conventions used by the demo databases:
//! `chunkEmbeddings` for the vector index and `chunkFulltext` for the
//! fulltext index.

use serde::Deserialize;

/// Default name of the vector index over chunk embeddings.
pub const DEFAULT_VECTOR_INDEX_NAME: &str = "chunkEmbeddings";

/// Default name of the fulltext index over chunk text.
pub const DEFAULT_FULLTEXT_INDEX_NAME: &str = "chunkFulltext";

/// Flat, immutable record of Neo4j connection parameters.
///
/// `uri`, `username`, and `password` are optional here; their absence is
/// only an error when a connection is actually opened.
#[derive(Debug, Clone, Deserialize)]
pub struct Neo4jSettings {
    pub uri: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_vector_index_name")]
    pub vector_index_name: String,
    #[serde(default = "default_fulltext_index_name")]
    pub fulltext_index_name: String,
}

fn default_vector_index_name() -> String {
    DEFAULT_VECTOR_INDEX_NAME.to_string()
}

fn default_fulltext_index_name() -> String {
    DEFAULT_FULLTEXT_INDEX_NAME.to_string()
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: None,
            username: None,
            password: None,
            vector_index_name: default_vector_index_name(),
            fulltext_index_name: default_fulltext_index_name(),
        }
    }
}

impl Neo4jSettings {
    /// Create settings with explicit connection values.
    pub fn new(
        uri: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            uri: Some(uri.into()),
            username: Some(username.into()),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    /// Load settings from `NEO4J_*` environment variables.
    ///
    /// Missing variables leave the corresponding field unset (or at its
    /// default for index names); nothing fails here.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    ///
    /// `from_env` delegates here; tests supply a map instead of mutating
    /// process-global environment state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            uri: lookup("NEO4J_URI"),
            username: lookup("NEO4J_USERNAME"),
            password: lookup("NEO4J_PASSWORD"),
            vector_index_name: lookup("NEO4J_VECTOR_INDEX_NAME")
                .unwrap_or_else(default_vector_index_name),
            fulltext_index_name: lookup("NEO4J_FULLTEXT_INDEX_NAME")
                .unwrap_or_else(default_fulltext_index_name),
        }
    }

    /// Override the vector index name.
    pub fn with_vector_index_name(mut self, name: impl Into<String>) -> Self {
        self.vector_index_name = name.into();
        self
    }

    /// Override the fulltext index name.
    pub fn with_fulltext_index_name(mut self, name: impl Into<String>) -> Self {
        self.fulltext_index_name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_settings_from_env() {
        let settings = Neo4jSettings::from_lookup(lookup_from(&[
            ("NEO4J_URI", "bolt://test:7687"),
            ("NEO4J_USERNAME", "testuser"),
            ("NEO4J_VECTOR_INDEX_NAME", "testindex"),
        ]));
        assert_eq!(settings.uri.as_deref(), Some("bolt://test:7687"));
        assert_eq!(settings.username.as_deref(), Some("testuser"));
        assert_eq!(settings.password, None);
        assert_eq!(settings.vector_index_name, "testindex");
    }

    #[test]
    fn test_settings_has_defaults() {
        let settings = Neo4jSettings::from_lookup(|_| None);
        assert_eq!(settings.vector_index_name, "chunkEmbeddings");
        assert_eq!(settings.fulltext_index_name, "chunkFulltext");
    }

    #[test]
    fn test_explicit_values_win() {
        let settings = Neo4jSettings::new("bolt://explicit:7687", "neo4j", "secret")
            .with_fulltext_index_name("documentSearch");
        assert_eq!(settings.uri.as_deref(), Some("bolt://explicit:7687"));
        assert_eq!(settings.fulltext_index_name, "documentSearch");
        assert_eq!(settings.vector_index_name, "chunkEmbeddings");
    }
}
