//! Application state: the session store, the optional LLM client, the
//! transcript client, and the prompt set.
//!
//! The workflow never touches a global; everything it needs hangs off this
//! struct, so tests can build one with the LLM disabled and get fully
//! deterministic local behavior.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::{load_agent_config_from_env, Prompts};
use crate::llm::Llm;
use crate::store::{MemorySessionStore, SessionStore};
use crate::transcript::TranscriptClient;

pub struct AppState {
    pub store: Arc<dyn SessionStore>,
    pub llm: Option<Llm>,
    pub prompts: Prompts,
    pub transcripts: TranscriptClient,
}

impl AppState {
    /// Build state from env: load config, init store and clients.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let prompts = load_agent_config_from_env()
            .map(|c| c.prompts)
            .unwrap_or_default();

        let llm = Llm::from_env();
        if let Some(l) = &llm {
            info!(target: "intellilearn_backend", base_url = %l.base_url, model = %l.model, "LLM enabled");
        } else {
            info!(target: "intellilearn_backend", "LLM disabled (no NIM_API_KEY). Using local fallbacks.");
        }

        Self {
            store: Arc::new(MemorySessionStore::new()),
            llm,
            prompts,
            transcripts: TranscriptClient::from_env(),
        }
    }
}
