//! Integration tests for the Neo4j context provider.
//!
//! These exercise the full `before_run` contract through the retriever
//! seam: a mock backend records the queries it receives and returns
//! canned results, so every no-op condition and publication rule can be
//! checked without a running database.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use neo4j_context::agents::{ContextProvider, Message, SessionContext};
use neo4j_context::provider::{Neo4jContextProvider, Neo4jContextProviderOptions, CONTEXT_KEY};
use neo4j_context::retriever::{IndexType, Retriever, RetrieverResult, RetrieverResultItem};
use neo4j_context::settings::Neo4jSettings;

// ─── Mock Retriever ─────────────────────────────────────────────────

/// Records every query it receives and returns a fixed result.
struct MockRetriever {
    result: RetrieverResult,
    queries: Mutex<Vec<String>>,
}

impl MockRetriever {
    fn returning(items: Vec<RetrieverResultItem>) -> Arc<Self> {
        Arc::new(Self {
            result: RetrieverResult { items },
            queries: Mutex::new(Vec::new()),
        })
    }

    fn recorded_queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    async fn search(&self, query_text: &str, _top_k: usize) -> Result<RetrieverResult> {
        self.queries.lock().unwrap().push(query_text.to_string());
        Ok(self.result.clone())
    }
}

/// Always fails, for error-propagation tests.
struct FailingRetriever;

#[async_trait]
impl Retriever for FailingRetriever {
    async fn search(&self, _query_text: &str, _top_k: usize) -> Result<RetrieverResult> {
        anyhow::bail!("index does not exist")
    }
}

fn item(content: &str, score: f64) -> RetrieverResultItem {
    let mut metadata = serde_json::Map::new();
    metadata.insert("score".to_string(), serde_json::json!(score));
    RetrieverResultItem {
        content: content.to_string(),
        score,
        metadata,
    }
}

fn fulltext_provider() -> Neo4jContextProvider {
    Neo4jContextProvider::new(
        Neo4jSettings::default(),
        Neo4jContextProviderOptions::default()
            .index_name("test_index")
            .index_type(IndexType::Fulltext),
    )
    .unwrap()
}

// ─── before_run ─────────────────────────────────────────────────────

#[tokio::test]
async fn before_run_no_op_when_not_connected() {
    let provider = fulltext_provider();

    let mut ctx = SessionContext::new(vec![Message::user("test query")]);
    provider.before_run(&mut ctx).await.unwrap();
    assert!(ctx.context_messages().is_empty());

    let mut ctx = SessionContext::new(vec![
        Message::user("first query"),
        Message::assistant("first response"),
    ]);
    provider.before_run(&mut ctx).await.unwrap();
    assert!(ctx.context_messages().is_empty());
}

#[tokio::test]
async fn before_run_returns_context_when_connected() {
    let mut provider = fulltext_provider();
    let mock = MockRetriever::returning(vec![
        item("Result about Acme Corp", 0.95),
        item("Result about products", 0.80),
    ]);
    provider.connect_with(mock.clone());
    assert!(provider.is_connected());

    let mut ctx = SessionContext::new(vec![Message::user("Tell me about Acme")]);
    provider.before_run(&mut ctx).await.unwrap();

    let messages = ctx.context_for(CONTEXT_KEY).expect("context published");
    // Header first, then one entry per result, in backend order.
    assert!(messages.len() >= 3);
    assert!(messages[0].text.contains("Knowledge Graph Context"));
    assert!(messages[1].text.contains("Acme Corp"));
    assert!(messages[2].text.contains("products"));
}

#[tokio::test]
async fn before_run_filters_non_user_assistant_messages() {
    let mut provider = fulltext_provider();
    let mock = MockRetriever::returning(vec![item("Some result", 0.9)]);
    provider.connect_with(mock.clone());

    let mut ctx = SessionContext::new(vec![
        Message::system("You are a helpful assistant"),
        Message::user("What about Acme?"),
        Message::assistant("Acme is a company."),
    ]);
    provider.before_run(&mut ctx).await.unwrap();

    let queries = mock.recorded_queries();
    assert_eq!(queries.len(), 1);
    assert!(queries[0].contains("What about Acme?"));
    assert!(queries[0].contains("Acme is a company."));
    assert!(!queries[0].contains("You are a helpful assistant"));
}

#[tokio::test]
async fn before_run_skips_empty_messages() {
    let mut provider = fulltext_provider();
    let mock = MockRetriever::returning(vec![item("Some result", 0.9)]);
    provider.connect_with(mock.clone());

    let mut ctx = SessionContext::new(vec![Message::user(""), Message::user("   ")]);
    provider.before_run(&mut ctx).await.unwrap();

    assert!(mock.recorded_queries().is_empty());
    assert!(ctx.context_messages().is_empty());
}

#[tokio::test]
async fn before_run_respects_message_history_count() {
    let mut provider = Neo4jContextProvider::new(
        Neo4jSettings::default(),
        Neo4jContextProviderOptions::default()
            .index_name("test_index")
            .index_type(IndexType::Fulltext)
            .message_history_count(2),
    )
    .unwrap();
    let mock = MockRetriever::returning(vec![item("Result", 0.9)]);
    provider.connect_with(mock.clone());

    let messages: Vec<Message> = ["first", "second", "third", "fourth", "fifth"]
        .iter()
        .map(|word| Message::user(format!("{} message", word)))
        .collect();
    let mut ctx = SessionContext::new(messages);
    provider.before_run(&mut ctx).await.unwrap();

    let queries = mock.recorded_queries();
    assert_eq!(queries.len(), 1);
    assert!(!queries[0].contains("first message"));
    assert!(!queries[0].contains("second message"));
    assert!(!queries[0].contains("third message"));
    assert!(queries[0].contains("fourth message"));
    assert!(queries[0].contains("fifth message"));
}

#[tokio::test]
async fn before_run_no_context_when_no_results() {
    let mut provider = fulltext_provider();
    let mock = MockRetriever::returning(Vec::new());
    provider.connect_with(mock.clone());

    let mut ctx = SessionContext::new(vec![Message::user("test query")]);
    provider.before_run(&mut ctx).await.unwrap();

    assert_eq!(mock.recorded_queries().len(), 1);
    assert!(ctx.context_messages().is_empty());
}

#[tokio::test]
async fn before_run_replaces_prior_context_for_key() {
    let mut provider = fulltext_provider();
    let mock = MockRetriever::returning(vec![item("fresh entry", 0.9)]);
    provider.connect_with(mock);

    let mut ctx = SessionContext::new(vec![Message::user("query")]);
    ctx.publish_context(CONTEXT_KEY, vec![Message::system("stale entry")]);
    provider.before_run(&mut ctx).await.unwrap();

    let messages = ctx.context_for(CONTEXT_KEY).unwrap();
    assert!(messages.iter().all(|m| !m.text.contains("stale entry")));
    assert!(messages.iter().any(|m| m.text.contains("fresh entry")));
}

#[tokio::test]
async fn before_run_propagates_search_errors() {
    let mut provider = fulltext_provider();
    provider.connect_with(Arc::new(FailingRetriever));

    let mut ctx = SessionContext::new(vec![Message::user("test query")]);
    let err = provider.before_run(&mut ctx).await.unwrap_err();

    assert!(err.to_string().contains("index does not exist"));
    assert!(ctx.context_messages().is_empty());
}

// ─── Connection lifecycle ───────────────────────────────────────────

#[tokio::test]
async fn disconnect_restores_no_op_behavior() {
    let mut provider = fulltext_provider();
    let mock = MockRetriever::returning(vec![item("Result", 0.9)]);
    provider.connect_with(mock.clone());
    assert!(provider.is_connected());

    provider.disconnect();
    assert!(!provider.is_connected());

    let mut ctx = SessionContext::new(vec![Message::user("test query")]);
    provider.before_run(&mut ctx).await.unwrap();
    assert!(mock.recorded_queries().is_empty());
    assert!(ctx.context_messages().is_empty());
}

#[tokio::test]
async fn provider_publishes_under_fixed_key() {
    let mut provider = fulltext_provider();
    assert_eq!(provider.context_key(), "neo4j-context");

    let mock = MockRetriever::returning(vec![item("Result", 0.9)]);
    provider.connect_with(mock);

    let mut ctx = SessionContext::new(vec![Message::user("query")]);
    provider.before_run(&mut ctx).await.unwrap();
    assert!(ctx.context_for("neo4j-context").is_some());
}
