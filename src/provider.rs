//! The Neo4j context provider.
//!
//! [`Neo4jContextProvider`] implements the run-session `before_run`
//! extension point: it assembles a search query from the trailing
//! conversational messages, issues exactly one search against the
//! configured index, and publishes the formatted results under
//! [`CONTEXT_KEY`] for prompt assembly.
//!
//! # Lifecycle
//!
//! 1. Construct with validated options ([`Neo4jContextProvider::new`]) —
//!    pure validation, no backend resource is touched.
//! 2. [`connect`](Neo4jContextProvider::connect) opens the driver and builds
//!    the retriever; [`is_connected`](Neo4jContextProvider::is_connected)
//!    flips to true.
//! 3. Zero or more runs invoke `before_run`, each performing at most one
//!    search call.
//! 4. [`disconnect`](Neo4jContextProvider::disconnect) (or drop) releases
//!    the connection on every exit path.
//!
//! Not connected, an empty assembled query, and zero search results are all
//! silent no-ops: the run simply gets no context. Search failures propagate
//! unchanged; the hook never retries.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::agents::{ContextProvider, Message, Role, SessionContext};
use crate::embedding::Embedder;
use crate::error::ConfigError;
use crate::neo4j::{self, Neo4jRetriever};
use crate::retriever::{IndexType, Retriever, RetrieverResult};
use crate::settings::Neo4jSettings;

/// The fixed key this provider publishes context under.
pub const CONTEXT_KEY: &str = "neo4j-context";

const DEFAULT_TOP_K: usize = 5;
const DEFAULT_MESSAGE_HISTORY_COUNT: usize = 10;
const DEFAULT_CONTEXT_PROMPT: &str = "## Knowledge Graph Context\n\
    Use the following results retrieved from the knowledge graph to ground \
    your response. Each record includes the matched content and its \
    relevance score:";

/// Request-time options for [`Neo4jContextProvider`].
///
/// `index_name` is always required. Vector and hybrid modes additionally
/// require an embedder; hybrid requires a distinct fulltext index name.
#[derive(Clone, Default)]
pub struct Neo4jContextProviderOptions {
    pub index_name: Option<String>,
    pub index_type: Option<IndexType>,
    pub embedder: Option<Arc<dyn Embedder>>,
    pub fulltext_index_name: Option<String>,
    pub retrieval_query: Option<String>,
    pub top_k: Option<usize>,
    pub message_history_count: Option<usize>,
    pub context_prompt: Option<String>,
}

impl Neo4jContextProviderOptions {
    pub fn index_name(mut self, name: impl Into<String>) -> Self {
        self.index_name = Some(name.into());
        self
    }

    pub fn index_type(mut self, index_type: IndexType) -> Self {
        self.index_type = Some(index_type);
        self
    }

    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn fulltext_index_name(mut self, name: impl Into<String>) -> Self {
        self.fulltext_index_name = Some(name.into());
        self
    }

    pub fn retrieval_query(mut self, query: impl Into<String>) -> Self {
        self.retrieval_query = Some(query.into());
        self
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn message_history_count(mut self, count: usize) -> Self {
        self.message_history_count = Some(count);
        self
    }

    pub fn context_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.context_prompt = Some(prompt.into());
        self
    }
}

/// Context provider backed by Neo4j graph search.
pub struct Neo4jContextProvider {
    settings: Neo4jSettings,
    index_name: String,
    index_type: IndexType,
    embedder: Option<Arc<dyn Embedder>>,
    fulltext_index_name: Option<String>,
    retrieval_query: Option<String>,
    top_k: usize,
    message_history_count: usize,
    context_prompt: String,
    retriever: Option<Arc<dyn Retriever>>,
}

impl Neo4jContextProvider {
    /// Validate options and construct the provider.
    ///
    /// Pure validation: no driver is created and no partial state is
    /// retained on failure.
    pub fn new(
        settings: Neo4jSettings,
        options: Neo4jContextProviderOptions,
    ) -> Result<Self, ConfigError> {
        let index_name = options.index_name.ok_or(ConfigError::MissingIndexName)?;
        let index_type = options.index_type.unwrap_or(IndexType::Fulltext);
        let top_k = options.top_k.unwrap_or(DEFAULT_TOP_K);

        // The fulltext-index check runs first so a hybrid configuration
        // missing both reports the index name, not the embedder.
        if index_type == IndexType::Hybrid && options.fulltext_index_name.is_none() {
            return Err(ConfigError::MissingFulltextIndexName);
        }
        if matches!(index_type, IndexType::Vector | IndexType::Hybrid)
            && options.embedder.is_none()
        {
            return Err(ConfigError::EmbedderRequired(index_type.to_string()));
        }
        if top_k < 1 {
            return Err(ConfigError::InvalidTopK(top_k));
        }

        Ok(Self {
            settings,
            index_name,
            index_type,
            embedder: options.embedder,
            fulltext_index_name: options.fulltext_index_name,
            retrieval_query: options.retrieval_query,
            top_k,
            message_history_count: options
                .message_history_count
                .unwrap_or(DEFAULT_MESSAGE_HISTORY_COUNT),
            context_prompt: options
                .context_prompt
                .unwrap_or_else(|| DEFAULT_CONTEXT_PROMPT.to_string()),
            retriever: None,
        })
    }

    /// Open the backend session and mark the provider connected.
    pub async fn connect(&mut self) -> Result<()> {
        let graph = neo4j::connect(&self.settings).await?;
        let retriever = Neo4jRetriever::new(
            graph,
            self.index_name.clone(),
            self.index_type,
            self.fulltext_index_name.clone(),
            self.embedder.clone(),
            self.retrieval_query.clone(),
        );
        self.retriever = Some(Arc::new(retriever));
        info!(index = %self.index_name, index_type = %self.index_type, "connected to Neo4j");
        Ok(())
    }

    /// Mark the provider connected using an externally supplied retriever.
    ///
    /// Useful for custom backends and for tests that stub out the search.
    pub fn connect_with(&mut self, retriever: Arc<dyn Retriever>) {
        self.retriever = Some(retriever);
    }

    /// Release the backend session and mark the provider disconnected.
    pub fn disconnect(&mut self) {
        self.retriever = None;
    }

    /// Whether a backend session is currently held. Consulted before any
    /// search is attempted.
    pub fn is_connected(&self) -> bool {
        self.retriever.is_some()
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn retrieval_query(&self) -> Option<&str> {
        self.retrieval_query.as_deref()
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn message_history_count(&self) -> usize {
        self.message_history_count
    }

    pub fn context_prompt(&self) -> &str {
        &self.context_prompt
    }

    /// Assemble the search query from the trailing conversational messages.
    ///
    /// Only user and assistant messages participate; system-authored text
    /// never reaches the search backend. Returns `None` when the joined
    /// text is empty or whitespace-only.
    fn build_query(&self, messages: &[Message]) -> Option<String> {
        let conversational: Vec<&str> = messages
            .iter()
            .filter(|m| matches!(m.role, Role::User | Role::Assistant))
            .map(|m| m.text.as_str())
            .collect();

        let trailing = conversational
            .iter()
            .skip(conversational.len().saturating_sub(self.message_history_count));

        let query = trailing
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if query.is_empty() {
            None
        } else {
            Some(query)
        }
    }

    /// Format search results as context messages: the prompt header first,
    /// then one entry per item in backend order.
    fn format_context(&self, result: &RetrieverResult) -> Vec<Message> {
        let mut messages = Vec::with_capacity(result.items.len() + 1);
        messages.push(Message::system(self.context_prompt.clone()));
        for item in &result.items {
            messages.push(Message::system(item.content.clone()));
        }
        messages
    }
}

// Derived Debug is unavailable through the embedder/retriever trait
// objects; show the configuration and readiness state instead.
impl fmt::Debug for Neo4jContextProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Neo4jContextProvider")
            .field("index_name", &self.index_name)
            .field("index_type", &self.index_type)
            .field("fulltext_index_name", &self.fulltext_index_name)
            .field("retrieval_query", &self.retrieval_query)
            .field("top_k", &self.top_k)
            .field("message_history_count", &self.message_history_count)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ContextProvider for Neo4jContextProvider {
    fn context_key(&self) -> &str {
        CONTEXT_KEY
    }

    async fn before_run(&self, ctx: &mut SessionContext) -> Result<()> {
        let Some(retriever) = self.retriever.as_ref() else {
            debug!("provider not connected, skipping context injection");
            return Ok(());
        };

        let Some(query) = self.build_query(&ctx.input_messages) else {
            debug!("no conversational text to search with, skipping");
            return Ok(());
        };

        let result = retriever.search(&query, self.top_k).await?;
        if result.is_empty() {
            debug!("search returned no results, publishing nothing");
            return Ok(());
        }

        let messages = self.format_context(&result);
        debug!(entries = messages.len(), "publishing graph context");
        ctx.publish_context(CONTEXT_KEY, messages);
        Ok(())
    }
}
