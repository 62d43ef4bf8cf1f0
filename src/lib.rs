//! # Neo4j Context
//!
//! A Neo4j-backed context provider for agent runs.
//!
//! Before each agent run, [`provider::Neo4jContextProvider`] searches a
//! graph database index (fulltext, vector, or hybrid) with the trailing
//! conversational messages and injects the formatted matches as context
//! messages, optionally enriched by a raw Cypher fragment that pulls in
//! related neighbors.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   before_run   ┌──────────────────┐
//! │ SessionContext│──────────────▶│ Neo4jContext     │
//! │ (messages)   │◀──────────────│ Provider         │
//! └──────────────┘  context slot  └───────┬──────────┘
//!                                         │ Retriever
//!                                         ▼
//!                                 ┌──────────────────┐
//!                                 │ Neo4jRetriever   │
//!                                 │ fulltext/vector/ │
//!                                 │ hybrid + Cypher  │
//!                                 └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use neo4j_context::agents::{ContextProvider, Message, SessionContext};
//! use neo4j_context::provider::{Neo4jContextProvider, Neo4jContextProviderOptions};
//! use neo4j_context::settings::Neo4jSettings;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut provider = Neo4jContextProvider::new(
//!     Neo4jSettings::from_env(),
//!     Neo4jContextProviderOptions::default().index_name("document_search"),
//! )?;
//! provider.connect().await?;
//!
//! let mut ctx = SessionContext::new(vec![Message::user("What about Acme?")]);
//! provider.before_run(&mut ctx).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`settings`] | Environment-sourced connection settings |
//! | [`error`] | Typed configuration errors |
//! | [`agents`] | Run-session protocol and the `ContextProvider` trait |
//! | [`embedding`] | Embedder seam for vector and hybrid search |
//! | [`retriever`] | Backend-agnostic search seam |
//! | [`neo4j`] | Neo4j retriever over `neo4rs` |
//! | [`provider`] | The context-provider adapter |

pub mod agents;
pub mod embedding;
pub mod error;
pub mod neo4j;
pub mod provider;
pub mod retriever;
pub mod settings;
