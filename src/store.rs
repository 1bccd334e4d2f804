//! Session store: the only shared mutable state in the system.
//!
//! The trait keeps workflow logic independent of the backing storage;
//! `MemorySessionStore` is the reference implementation, and a persistent
//! backend is a drop-in substitute behind the same contract. Updates are
//! atomic per session id (whole-record read-modify-write under one lock);
//! different sessions are fully independent.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::SessionState;
use crate::error::TutorError;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session, optionally with a caller-chosen id. Creating an id
    /// that already exists is a no-op returning the same id.
    async fn create(&self, id: Option<String>) -> String;

    /// Fetch a snapshot of the session state.
    async fn get(&self, id: &str) -> Result<SessionState, TutorError>;

    /// Atomically mutate the session record and return the updated snapshot.
    async fn update(
        &self,
        id: &str,
        mutate: Box<dyn for<'a> FnOnce(&'a mut SessionState) + Send>,
    ) -> Result<SessionState, TutorError>;
}

/// In-memory store over a RwLock'd map. Never evicts; expiry is a concern
/// for persistent backends.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionState>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, id: Option<String>) -> String {
        let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
        self.sessions
            .write()
            .await
            .entry(id.clone())
            .or_insert_with(SessionState::default);
        id
    }

    async fn get(&self, id: &str) -> Result<SessionState, TutorError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| TutorError::NotFound(id.to_string()))
    }

    async fn update(
        &self,
        id: &str,
        mutate: Box<dyn for<'a> FnOnce(&'a mut SessionState) + Send>,
    ) -> Result<SessionState, TutorError> {
        let mut sessions = self.sessions.write().await;
        let state = sessions
            .get_mut(id)
            .ok_or_else(|| TutorError::NotFound(id.to_string()))?;
        mutate(state);
        Ok(state.clone())
    }
}
