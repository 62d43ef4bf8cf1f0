//! Neo4j-backed [`Retriever`] implementation.
//!
//! Wraps a `neo4rs` connection pool and the two index procedures Neo4j
//! exposes for retrieval:
//!
//! - `db.index.fulltext.queryNodes` — keyword search over a fulltext index
//! - `db.index.vector.queryNodes` — similarity search over a vector index
//!
//! Hybrid mode runs both channels, min-max normalizes each channel's scores,
//! and merges them with equal weighting.
//!
//! An optional raw Cypher enrichment fragment can be appended after the
//! `YIELD node, score` clause to pull in related neighbors before results
//! are returned. The fragment is handed to the database unmodified.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use neo4rs::{Graph, Query};
use tracing::debug;

use crate::embedding::Embedder;
use crate::error::ConfigError;
use crate::retriever::{IndexType, Retriever, RetrieverResult, RetrieverResultItem};
use crate::settings::Neo4jSettings;

/// Relative weight of the vector channel in hybrid score merging.
const HYBRID_ALPHA: f64 = 0.5;

/// Tail clause used when no enrichment query is supplied.
const DEFAULT_RETURN: &str =
    "RETURN coalesce(node.text, '') AS text, properties(node) AS properties, score";

/// Open a connection pool and verify the database is reachable.
///
/// Fails with a [`ConfigError`] when the URI is missing; driver errors
/// surface to whatever code entered the connection scope.
pub async fn connect(settings: &Neo4jSettings) -> Result<Graph> {
    let uri = settings
        .uri
        .as_deref()
        .ok_or(ConfigError::MissingSetting("NEO4J_URI"))?;
    let username = settings.username.as_deref().unwrap_or("");
    let password = settings.password.as_deref().unwrap_or("");

    let graph = Graph::new(uri, username, password).context("Failed to connect to Neo4j")?;

    // Connections are pooled lazily; round-trip once so connect() fails
    // here rather than on the first search.
    graph
        .run(Query::new("RETURN 1".to_string()))
        .await
        .with_context(|| format!("Neo4j at {} is not reachable", uri))?;

    Ok(graph)
}

/// Retriever over Neo4j fulltext and vector indexes.
pub struct Neo4jRetriever {
    graph: Graph,
    index_name: String,
    index_type: IndexType,
    fulltext_index_name: Option<String>,
    embedder: Option<Arc<dyn Embedder>>,
    retrieval_query: Option<String>,
}

impl Neo4jRetriever {
    pub fn new(
        graph: Graph,
        index_name: impl Into<String>,
        index_type: IndexType,
        fulltext_index_name: Option<String>,
        embedder: Option<Arc<dyn Embedder>>,
        retrieval_query: Option<String>,
    ) -> Self {
        Self {
            graph,
            index_name: index_name.into(),
            index_type,
            fulltext_index_name,
            embedder,
            retrieval_query,
        }
    }

    fn tail_clause(&self) -> &str {
        self.retrieval_query.as_deref().unwrap_or(DEFAULT_RETURN)
    }

    async fn fulltext_channel(
        &self,
        index_name: &str,
        query_text: &str,
        top_k: usize,
    ) -> Result<Vec<RetrieverResultItem>> {
        let cypher = format!(
            "CALL db.index.fulltext.queryNodes($index_name, $query_text, {{limit: $top_k}}) \
             YIELD node, score\n{}",
            self.tail_clause()
        );
        let query = Query::new(cypher)
            .param("index_name", index_name.to_string())
            .param("query_text", query_text.to_string())
            .param("top_k", top_k as i64);

        self.collect_items(query).await
    }

    async fn vector_channel(
        &self,
        index_name: &str,
        query_text: &str,
        top_k: usize,
    ) -> Result<Vec<RetrieverResultItem>> {
        let embedder = self
            .embedder
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Vector search requires an embedder"))?;

        let embedding = embedder.embed_query(query_text).await?;
        let embedding: Vec<f64> = embedding.into_iter().map(f64::from).collect();

        let cypher = format!(
            "CALL db.index.vector.queryNodes($index_name, $top_k, $embedding) \
             YIELD node, score\n{}",
            self.tail_clause()
        );
        let query = Query::new(cypher)
            .param("index_name", index_name.to_string())
            .param("top_k", top_k as i64)
            .param("embedding", embedding);

        self.collect_items(query).await
    }

    async fn collect_items(&self, query: Query) -> Result<Vec<RetrieverResultItem>> {
        let enriched = self.retrieval_query.is_some();
        let mut result = self
            .graph
            .execute(query)
            .await
            .context("Neo4j search query failed")?;

        let mut items = Vec::new();
        while let Some(row) = result.next().await? {
            let item = if enriched {
                parse_enriched_row(&row)?
            } else {
                parse_default_row(&row)?
            };
            items.push(item);
        }

        debug!(count = items.len(), index = %self.index_name, "search returned items");
        Ok(items)
    }
}

#[async_trait]
impl Retriever for Neo4jRetriever {
    async fn search(&self, query_text: &str, top_k: usize) -> Result<RetrieverResult> {
        let items = match self.index_type {
            IndexType::Fulltext => {
                self.fulltext_channel(&self.index_name, query_text, top_k)
                    .await?
            }
            IndexType::Vector => {
                self.vector_channel(&self.index_name, query_text, top_k)
                    .await?
            }
            IndexType::Hybrid => {
                let fulltext_index = self
                    .fulltext_index_name
                    .as_deref()
                    .ok_or(ConfigError::MissingFulltextIndexName)?;
                let fulltext = self
                    .fulltext_channel(fulltext_index, query_text, top_k)
                    .await?;
                let vector = self
                    .vector_channel(&self.index_name, query_text, top_k)
                    .await?;
                merge_hybrid(fulltext, vector, top_k)
            }
        };

        Ok(RetrieverResult { items })
    }
}

/// Parse a row produced by [`DEFAULT_RETURN`].
fn parse_default_row(row: &neo4rs::Row) -> Result<RetrieverResultItem> {
    let text: String = row.get("text").context("row is missing 'text'")?;
    let properties: serde_json::Value =
        row.get("properties").context("row is missing 'properties'")?;
    let score: f64 = row.get("score").context("row is missing 'score'")?;

    // Nodes without a text property fall back to their serialized properties.
    let content = if text.trim().is_empty() {
        serde_json::to_string(&properties)?
    } else {
        text
    };

    let mut metadata = serde_json::Map::new();
    metadata.insert("score".to_string(), serde_json::json!(score));
    if let serde_json::Value::Object(props) = properties {
        for (key, value) in props {
            metadata.entry(key).or_insert(value);
        }
    }

    Ok(RetrieverResultItem {
        content,
        score,
        metadata,
    })
}

/// Parse a row produced by a caller-supplied enrichment query.
///
/// Column names are unknown ahead of time, so the whole row is captured as
/// metadata. Content prefers a `text` column when the query returns one and
/// falls back to the serialized record otherwise.
fn parse_enriched_row(row: &neo4rs::Row) -> Result<RetrieverResultItem> {
    let value: serde_json::Value = row
        .to()
        .context("Failed to deserialize enrichment query row")?;

    let metadata = match value {
        serde_json::Value::Object(map) => map,
        other => {
            let mut map = serde_json::Map::new();
            map.insert("value".to_string(), other);
            map
        }
    };

    let score = metadata
        .get("score")
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);

    let content = match metadata.get("text").and_then(|v| v.as_str()) {
        Some(text) if !text.trim().is_empty() => text.to_string(),
        _ => serde_json::to_string(&serde_json::Value::Object(metadata.clone()))?,
    };

    Ok(RetrieverResultItem {
        content,
        score,
        metadata,
    })
}

/// Min-max normalize raw scores to [0, 1].
///
/// A channel where every score is equal normalizes to all 1.0.
fn normalize_scores(items: &[RetrieverResultItem]) -> Vec<f64> {
    if items.is_empty() {
        return Vec::new();
    }

    let s_min = items.iter().map(|i| i.score).fold(f64::INFINITY, f64::min);
    let s_max = items
        .iter()
        .map(|i| i.score)
        .fold(f64::NEG_INFINITY, f64::max);

    items
        .iter()
        .map(|i| {
            if (s_max - s_min).abs() < f64::EPSILON {
                1.0
            } else {
                (i.score - s_min) / (s_max - s_min)
            }
        })
        .collect()
}

/// Merge fulltext and vector channels into a single ranked list.
///
/// Items surfacing in both channels are keyed by content and receive a
/// weighted sum of their normalized channel scores; items seen by only one
/// channel contribute zero from the other.
fn merge_hybrid(
    fulltext: Vec<RetrieverResultItem>,
    vector: Vec<RetrieverResultItem>,
    top_k: usize,
) -> Vec<RetrieverResultItem> {
    let fulltext_norm = normalize_scores(&fulltext);
    let vector_norm = normalize_scores(&vector);

    let mut merged: Vec<RetrieverResultItem> = Vec::new();
    let mut index_by_content: HashMap<String, usize> = HashMap::new();

    for (item, norm) in fulltext.into_iter().zip(fulltext_norm) {
        index_by_content.insert(item.content.clone(), merged.len());
        let mut item = item;
        item.score = (1.0 - HYBRID_ALPHA) * norm;
        merged.push(item);
    }

    for (item, norm) in vector.into_iter().zip(vector_norm) {
        match index_by_content.get(&item.content) {
            Some(&idx) => {
                merged[idx].score += HYBRID_ALPHA * norm;
                for (key, value) in item.metadata {
                    merged[idx].metadata.entry(key).or_insert(value);
                }
            }
            None => {
                index_by_content.insert(item.content.clone(), merged.len());
                let mut item = item;
                item.score = HYBRID_ALPHA * norm;
                merged.push(item);
            }
        }
    }

    for item in &mut merged {
        item.metadata
            .insert("score".to_string(), serde_json::json!(item.score));
    }

    merged.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    merged.truncate(top_k);
    merged
}
