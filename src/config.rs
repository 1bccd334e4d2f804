//! Loading agent configuration (prompt overrides) from TOML.
//!
//! See `AgentConfig` and `Prompts` for the expected schema.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
}

/// Prompts used by the LLM client. Defaults are sensible for the tutoring
/// workflow; override them in TOML if you need to tune tone/structure.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  // Concept extraction
  pub extract_system: String,
  pub extract_user_template: String,
  // Quiz generation
  pub quiz_system: String,
  pub quiz_user_template: String,
  // Feedback prose
  pub feedback_system: String,
  pub feedback_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      extract_system: "You are a curriculum expert. Respond ONLY with strict JSON.".into(),
      extract_user_template: "Analyze the following study material and extract the top 5-7 core educational concepts. Return JSON: {\"concepts\": [string]}. Keep each concept short (2-4 words).\n\nMaterial:\n{content}".into(),
      quiz_system: "You are an expert examiner. Respond ONLY with strict JSON.".into(),
      quiz_user_template: "Create a 5-question multiple choice quiz at difficulty '{difficulty}' covering these concepts: {concepts}. Each question must have exactly 4 options. Return JSON: {\"questions\": [{\"prompt\": string, \"options\": [string], \"correct\": string, \"explanation\": string, \"concept\": string}]}. 'correct' must be copied verbatim from 'options' and 'concept' must be one of the listed concepts.".into(),
      feedback_system: "You are a supportive personal tutor. Be encouraging and concise (3-5 sentences). Output plain text only.".into(),
      feedback_user_template: "The student scored {score}/100 on a {difficulty} quiz. Topics they struggled with: {weak_topics}. Encourage them and briefly explain what to review.".into(),
    }
  }
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AgentConfig>(&s) {
      Ok(cfg) => {
        info!(target: "intellilearn_backend", %path, "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "intellilearn_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "intellilearn_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
