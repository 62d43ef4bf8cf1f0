//! Minimal run-session protocol for context injection.
//!
//! An agent run carries an ordered list of role-tagged input messages and a
//! per-run context slot: a mapping from provider key to an ordered sequence
//! of formatted context messages. Providers implement [`ContextProvider`]
//! and publish into the slot from their `before_run` hook; the surrounding
//! runtime assembles the prompt from whatever was published.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Author of a conversational message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A role-tagged text message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }
}

/// Per-run state handed to context providers before the agent proceeds.
///
/// `input_messages` is the run's incoming conversation. Context published
/// under a key replaces any prior value for that key; entries are never
/// merged across runs.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub input_messages: Vec<Message>,
    context_messages: HashMap<String, Vec<Message>>,
}

impl SessionContext {
    pub fn new(input_messages: Vec<Message>) -> Self {
        Self {
            input_messages,
            context_messages: HashMap::new(),
        }
    }

    /// Publish an ordered sequence of context messages under a provider key,
    /// replacing any prior value for that key.
    pub fn publish_context(&mut self, key: impl Into<String>, messages: Vec<Message>) {
        self.context_messages.insert(key.into(), messages);
    }

    /// All published context, keyed by provider.
    pub fn context_messages(&self) -> &HashMap<String, Vec<Message>> {
        &self.context_messages
    }

    /// Context published under a specific provider key, if any.
    pub fn context_for(&self, key: &str) -> Option<&[Message]> {
        self.context_messages.get(key).map(|m| m.as_slice())
    }
}

/// Extension point invoked before each agent run.
///
/// Implementations inspect the run's input messages and may publish zero or
/// more context messages under their [`context_key`](ContextProvider::context_key).
/// Failures propagate to the caller; the runtime performs no retry.
#[async_trait]
pub trait ContextProvider: Send + Sync {
    /// The fixed key this provider publishes under.
    fn context_key(&self) -> &str;

    /// Inspect the run and publish context before the agent proceeds.
    async fn before_run(&self, ctx: &mut SessionContext) -> Result<()>;
}
