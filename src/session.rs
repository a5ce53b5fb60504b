//! Per-sender session storage

use crate::state_machine::SessionState;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Storage for conversational state, keyed by sender identity
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current state for a sender, if one exists
    async fn get(&self, sender: &str) -> Result<Option<SessionState>, String>;

    /// Insert or replace the state for a sender
    async fn upsert(&self, sender: &str, state: &SessionState) -> Result<(), String>;

    /// Forget a sender entirely
    async fn delete(&self, sender: &str) -> Result<(), String>;

    /// Current state, creating an idle session on first contact
    async fn get_or_create(&self, sender: &str) -> Result<SessionState, String> {
        if let Some(state) = self.get(sender).await? {
            return Ok(state);
        }
        let state = SessionState::Idle;
        self.upsert(sender, &state).await?;
        Ok(state)
    }
}

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn get(&self, sender: &str) -> Result<Option<SessionState>, String> {
        (**self).get(sender).await
    }

    async fn upsert(&self, sender: &str, state: &SessionState) -> Result<(), String> {
        (**self).upsert(sender, state).await
    }

    async fn delete(&self, sender: &str) -> Result<(), String> {
        (**self).delete(sender).await
    }
}

/// Process-lifetime session map
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionState>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, sender: &str) -> Result<Option<SessionState>, String> {
        Ok(self.sessions.read().await.get(sender).cloned())
    }

    async fn upsert(&self, sender: &str, state: &SessionState) -> Result<(), String> {
        self.sessions
            .write()
            .await
            .insert(sender.to_string(), state.clone());
        Ok(())
    }

    async fn delete(&self, sender: &str) -> Result<(), String> {
        self.sessions.write().await.remove(sender);
        Ok(())
    }
}
