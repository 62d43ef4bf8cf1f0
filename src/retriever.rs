//! Narrow retrieval seam between the context provider and the search backend.
//!
//! The provider only ever sees [`Retriever`]: query text and a limit in,
//! an ordered sequence of scored items out. Backend-specific types stay in
//! the implementing module ([`crate::neo4j`]), so alternative backends can
//! be dropped in for tests or custom deployments.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which backend index a search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    /// Vector embedding index (requires an embedder).
    Vector,
    /// Full-text keyword index.
    Fulltext,
    /// Both channels, merged by normalized score (requires an embedder
    /// and a distinct fulltext index).
    Hybrid,
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndexType::Vector => "vector",
            IndexType::Fulltext => "fulltext",
            IndexType::Hybrid => "hybrid",
        };
        f.write_str(name)
    }
}

impl FromStr for IndexType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "vector" => Ok(IndexType::Vector),
            "fulltext" => Ok(IndexType::Fulltext),
            "hybrid" => Ok(IndexType::Hybrid),
            other => anyhow::bail!(
                "Unknown index type: {}. Use vector, fulltext, or hybrid.",
                other
            ),
        }
    }
}

/// One scored search hit.
#[derive(Debug, Clone, Serialize)]
pub struct RetrieverResultItem {
    /// Free-text content of the matched node (or a serialized record when
    /// the backend returns structured columns).
    pub content: String,
    /// Relevance score as reported by the backend.
    pub score: f64,
    /// Arbitrary backend-supplied columns and node properties.
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Ordered search results, best first. Produced fresh per call; never
/// cached or persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetrieverResult {
    pub items: Vec<RetrieverResultItem>,
}

impl RetrieverResult {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A search capability over some backend index.
///
/// Implementations own ranking: items come back in descending relevance
/// order and at most `top_k` of them.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn search(&self, query_text: &str, top_k: usize) -> Result<RetrieverResult>;
}
