//! # Graph Context CLI (`graphctx`)
//!
//! Demo binary for the Neo4j context provider. It exercises the same
//! provider the library exposes to agent runtimes: connect to the graph
//! database, assemble a search query from a question, and print the
//! context entries the provider would inject into an agent run.
//!
//! ## Usage
//!
//! ```bash
//! # Connection settings come from the environment (or a .env file):
//! #   NEO4J_URI, NEO4J_USERNAME, NEO4J_PASSWORD
//! #   NEO4J_VECTOR_INDEX_NAME, NEO4J_FULLTEXT_INDEX_NAME
//!
//! # Verify connectivity and show the configured index names
//! graphctx check
//!
//! # Fulltext search over the document index
//! graphctx ask "hydraulic pump maintenance" --index document_search
//!
//! # Vector search (requires OPENAI_API_KEY)
//! graphctx ask "landing gear inspection intervals" \
//!     --index chunkEmbeddings --index-type vector
//!
//! # Graph-enriched retrieval with a raw Cypher fragment
//! graphctx ask "engine overhaul" --index document_search \
//!     --enrich queries/maintenance_docs.cypher
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use neo4j_context::agents::{ContextProvider, Message, SessionContext};
use neo4j_context::embedding::OpenAIEmbedder;
use neo4j_context::provider::{Neo4jContextProvider, Neo4jContextProviderOptions, CONTEXT_KEY};
use neo4j_context::retriever::IndexType;
use neo4j_context::settings::Neo4jSettings;

/// Graph Context — demo CLI for the Neo4j context provider.
#[derive(Parser)]
#[command(
    name = "graphctx",
    about = "Neo4j-backed context retrieval for agent runs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify connectivity and show the configured index names.
    Check,

    /// Run one provider round-trip for a question and print the context
    /// entries that would be injected into an agent run.
    Ask {
        /// The question to search with.
        question: String,

        /// Search index name. Defaults to the settings' fulltext index
        /// (or vector index for vector mode).
        #[arg(long)]
        index: Option<String>,

        /// Index type: `fulltext`, `vector`, or `hybrid`.
        #[arg(long, default_value = "fulltext")]
        index_type: IndexType,

        /// Maximum number of results.
        #[arg(long, default_value_t = 5)]
        top_k: usize,

        /// Path to a file holding a raw Cypher enrichment fragment,
        /// appended after `YIELD node, score`.
        #[arg(long)]
        enrich: Option<PathBuf>,

        /// Override the context prompt header.
        #[arg(long)]
        context_prompt: Option<String>,

        /// Embedding model for vector/hybrid modes.
        #[arg(long, default_value = "text-embedding-3-small")]
        embedding_model: String,

        /// Embedding dimensionality for vector/hybrid modes.
        #[arg(long, default_value_t = 1536)]
        embedding_dims: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let settings = Neo4jSettings::from_env();

    match cli.command {
        Commands::Check => run_check(settings).await,
        Commands::Ask {
            question,
            index,
            index_type,
            top_k,
            enrich,
            context_prompt,
            embedding_model,
            embedding_dims,
        } => {
            run_ask(
                settings,
                &question,
                index,
                index_type,
                top_k,
                enrich,
                context_prompt,
                &embedding_model,
                embedding_dims,
            )
            .await
        }
    }
}

async fn run_check(settings: Neo4jSettings) -> Result<()> {
    let uri = settings.uri.clone().unwrap_or_else(|| "(unset)".to_string());
    println!("Neo4j URI:       {}", uri);
    println!("Vector index:    {}", settings.vector_index_name);
    println!("Fulltext index:  {}", settings.fulltext_index_name);

    match neo4j_context::neo4j::connect(&settings).await {
        Ok(_) => {
            println!("Connection:      OK");
            Ok(())
        }
        Err(e) => {
            // Demo-level presentation; the library itself never swallows
            // connection errors.
            eprintln!("Connection:      FAILED");
            eprintln!("  {:#}", e);
            std::process::exit(1);
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_ask(
    settings: Neo4jSettings,
    question: &str,
    index: Option<String>,
    index_type: IndexType,
    top_k: usize,
    enrich: Option<PathBuf>,
    context_prompt: Option<String>,
    embedding_model: &str,
    embedding_dims: usize,
) -> Result<()> {
    let index_name = index.unwrap_or_else(|| match index_type {
        IndexType::Fulltext => settings.fulltext_index_name.clone(),
        IndexType::Vector | IndexType::Hybrid => settings.vector_index_name.clone(),
    });

    let mut options = Neo4jContextProviderOptions::default()
        .index_name(index_name.clone())
        .index_type(index_type)
        .top_k(top_k);

    if matches!(index_type, IndexType::Vector | IndexType::Hybrid) {
        let embedder = OpenAIEmbedder::new(embedding_model, embedding_dims)?;
        options = options.embedder(Arc::new(embedder));
    }
    if index_type == IndexType::Hybrid {
        options = options.fulltext_index_name(settings.fulltext_index_name.clone());
    }
    if let Some(path) = enrich {
        let cypher = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read enrichment query: {}", path.display()))?;
        options = options.retrieval_query(cypher);
    }
    if let Some(prompt) = context_prompt {
        options = options.context_prompt(prompt);
    }

    let mut provider = Neo4jContextProvider::new(settings, options)?;
    if let Err(e) = provider.connect().await {
        eprintln!("Could not connect to Neo4j: {:#}", e);
        std::process::exit(1);
    }

    println!("Index: {} ({})", index_name, index_type);
    println!("Question: {}\n", question);

    let mut ctx = SessionContext::new(vec![Message::user(question)]);
    provider.before_run(&mut ctx).await?;

    match ctx.context_for(CONTEXT_KEY) {
        Some(messages) => {
            for (i, message) in messages.iter().enumerate() {
                if i == 0 {
                    println!("{}\n", message.text);
                } else {
                    println!("{}. {}\n", i, message.text.replace('\n', " "));
                }
            }
        }
        None => println!("No results."),
    }

    provider.disconnect();
    Ok(())
}
