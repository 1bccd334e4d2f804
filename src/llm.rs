//! Minimal client for an OpenAI-compatible completion endpoint (NVIDIA NIM).
//!
//! We only call chat.completions and request either plain text or a strict
//! JSON object. Model output is an untrusted boundary: everything structured
//! is parsed and schema-validated before it reaches the workflow, and a
//! mismatch surfaces as `UpstreamGeneration` rather than crashing anything.
//! Calls are instrumented and log model names, latencies, and response sizes
//! (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::Prompts;
use crate::domain::{Difficulty, Question, Quiz, OPTIONS_PER_QUESTION, QUIZ_LEN};
use crate::error::TutorError;
use crate::util::fill_template;
use uuid::Uuid;

const DEFAULT_BASE_URL: &str = "https://integrate.api.nvidia.com/v1";
const DEFAULT_MODEL: &str = "meta/llama-3.1-405b-instruct";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct Llm {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

/// Raw shape we ask the model for when extracting concepts.
#[derive(Deserialize)]
struct GenConcepts {
  concepts: Vec<String>,
}

/// Raw shape we ask the model for when generating a quiz.
#[derive(Deserialize)]
pub struct GenQuiz {
  pub questions: Vec<GenQuestion>,
}

#[derive(Deserialize)]
pub struct GenQuestion {
  pub prompt: String,
  pub options: Vec<String>,
  pub correct: String,
  pub explanation: String,
  #[serde(default)]
  pub concept: String,
}

impl Llm {
  /// Construct the client if we find NIM_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("NIM_API_KEY").ok()?;
    let base_url =
      std::env::var("NIM_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let model = std::env::var("NIM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
    let timeout = std::env::var("NIM_TIMEOUT_SECS")
      .ok()
      .and_then(|s| s.parse::<u64>().ok())
      .unwrap_or(DEFAULT_TIMEOUT_SECS);

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(timeout))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, model })
  }

  fn transport_error(e: reqwest::Error) -> TutorError {
    if e.is_timeout() {
      TutorError::UpstreamTimeout
    } else {
      TutorError::UpstreamGeneration(e.to_string())
    }
  }

  /// Plain-text chat completion. Used for feedback prose.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.model))]
  async fn chat_plain(
    &self,
    system: &str,
    user: &str,
    temperature: f32,
  ) -> Result<String, TutorError> {
    let body = self.chat(system, user, temperature, None).await?;
    let text = body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default().trim().to_string();
    Ok(text)
  }

  /// JSON-object chat completion. Generic over the target type T.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.model))]
  async fn chat_json<T: for<'a> Deserialize<'a>>(
    &self,
    system: &str,
    user: &str,
    temperature: f32,
  ) -> Result<T, TutorError> {
    let body = self
      .chat(system, user, temperature, Some(ResponseFormat { r#type: "json_object".into() }))
      .await?;
    let text = body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default();

    serde_json::from_str::<T>(&text)
      .map_err(|e| TutorError::UpstreamGeneration(format!("JSON parse error: {}", e)))
  }

  async fn chat(
    &self,
    system: &str,
    user: &str,
    temperature: f32,
    response_format: Option<ResponseFormat>,
  ) -> Result<ChatCompletionResponse, TutorError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
      response_format,
      max_tokens: None,
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "intellilearn-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await.map_err(Self::transport_error)?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_api_error(&body).unwrap_or(body);
      return Err(TutorError::UpstreamGeneration(format!("HTTP {}: {}", status, msg)));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(Self::transport_error)?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "LLM usage");
    }
    Ok(body)
  }

  // --- High-level helpers (domain-specialized) ---

  /// Ask the model for 5-7 core concepts in the given material.
  /// The caller post-processes (trim/dedup); this only enforces JSON shape.
  #[instrument(level = "info", skip(self, prompts, content), fields(content_len = content.len()))]
  pub async fn extract_concepts(
    &self,
    prompts: &Prompts,
    content: &str,
  ) -> Result<Vec<String>, TutorError> {
    // Truncate very large uploads; the head of the material is enough for
    // concept extraction.
    let head: String = content.chars().take(10_000).collect();
    let user = fill_template(&prompts.extract_user_template, &[("content", &head)]);
    let gen: GenConcepts = self.chat_json(&prompts.extract_system, &user, 0.2).await?;
    Ok(gen.concepts)
  }

  /// Generate a full quiz and validate it into the domain shape.
  #[instrument(level = "info", skip(self, prompts, concepts), fields(%difficulty, model = %self.model, n_concepts = concepts.len()))]
  pub async fn generate_quiz(
    &self,
    prompts: &Prompts,
    concepts: &[String],
    difficulty: Difficulty,
  ) -> Result<Quiz, TutorError> {
    let user = fill_template(
      &prompts.quiz_user_template,
      &[("difficulty", difficulty.as_str()), ("concepts", &concepts.join(", "))],
    );
    let start = std::time::Instant::now();
    let gen: GenQuiz = self.chat_json(&prompts.quiz_system, &user, 0.7).await?;
    info!(elapsed = ?start.elapsed(), "Quiz generation response received");

    quiz_from_generated(gen, difficulty, concepts)
  }

  /// Compose encouraging feedback prose for one graded round.
  #[instrument(level = "info", skip(self, prompts, weak_topics), fields(n_weak = weak_topics.len()))]
  pub async fn feedback_text(
    &self,
    prompts: &Prompts,
    score: u8,
    difficulty: Difficulty,
    weak_topics: &[String],
  ) -> Result<String, TutorError> {
    let topics = if weak_topics.is_empty() { "none".to_string() } else { weak_topics.join(", ") };
    let user = fill_template(
      &prompts.feedback_user_template,
      &[
        ("score", &score.to_string()),
        ("difficulty", difficulty.as_str()),
        ("weak_topics", &topics),
      ],
    );
    self.chat_plain(&prompts.feedback_system, &user, 0.5).await
  }
}

/// Validate raw generated output into a `Quiz`, rejecting shape violations.
/// Each question's concept is snapped onto the supplied concept list
/// (case-insensitive) so weak-topic attribution stays within the session's
/// vocabulary; an unmappable label is kept verbatim rather than dropped.
pub fn quiz_from_generated(
  gen: GenQuiz,
  difficulty: Difficulty,
  concepts: &[String],
) -> Result<Quiz, TutorError> {
  if gen.questions.len() != QUIZ_LEN {
    return Err(TutorError::UpstreamGeneration(format!(
      "expected {} questions, model returned {}",
      QUIZ_LEN,
      gen.questions.len()
    )));
  }

  let mut questions = Vec::with_capacity(QUIZ_LEN);
  for (i, q) in gen.questions.into_iter().enumerate() {
    if q.options.len() != OPTIONS_PER_QUESTION {
      return Err(TutorError::UpstreamGeneration(format!(
        "question {} has {} options, expected {}",
        i + 1,
        q.options.len(),
        OPTIONS_PER_QUESTION
      )));
    }
    if !q.options.iter().any(|o| o.trim() == q.correct.trim()) {
      return Err(TutorError::UpstreamGeneration(format!(
        "question {}: correct answer is not among the options",
        i + 1
      )));
    }
    let concept = concepts
      .iter()
      .find(|c| c.eq_ignore_ascii_case(q.concept.trim()))
      .cloned()
      .unwrap_or_else(|| q.concept.trim().to_string());
    questions.push(Question {
      prompt: q.prompt,
      options: q.options,
      correct: q.correct.trim().to_string(),
      explanation: q.explanation,
      concept,
    });
  }

  Ok(Quiz { id: Uuid::new_v4().to_string(), difficulty, questions })
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from an OpenAI-style error body.
fn extract_api_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn gen_question(concept: &str) -> GenQuestion {
    GenQuestion {
      prompt: "What does a base case do?".into(),
      options: vec!["Stops recursion".into(), "Speeds loops".into(), "Frees memory".into(), "Sorts data".into()],
      correct: "Stops recursion".into(),
      explanation: "Without it recursion never terminates.".into(),
      concept: concept.into(),
    }
  }

  #[test]
  fn valid_generation_becomes_a_quiz() {
    let gen = GenQuiz { questions: (0..5).map(|_| gen_question("recursion")).collect() };
    let concepts = vec!["Recursion".to_string(), "Loops".to_string()];
    let quiz = quiz_from_generated(gen, Difficulty::Hard, &concepts).unwrap();
    assert_eq!(quiz.questions.len(), 5);
    assert_eq!(quiz.difficulty, Difficulty::Hard);
    // Concept label snapped onto the supplied spelling.
    assert_eq!(quiz.questions[0].concept, "Recursion");
  }

  #[test]
  fn wrong_question_count_is_rejected() {
    let gen = GenQuiz { questions: (0..3).map(|_| gen_question("Recursion")).collect() };
    let err = quiz_from_generated(gen, Difficulty::Medium, &["Recursion".into()]).unwrap_err();
    assert!(matches!(err, TutorError::UpstreamGeneration(_)));
  }

  #[test]
  fn correct_answer_must_be_an_option() {
    let mut q = gen_question("Recursion");
    q.correct = "Something else".into();
    let mut questions: Vec<GenQuestion> = (0..4).map(|_| gen_question("Recursion")).collect();
    questions.push(q);
    let err = quiz_from_generated(GenQuiz { questions }, Difficulty::Medium, &["Recursion".into()])
      .unwrap_err();
    assert!(matches!(err, TutorError::UpstreamGeneration(_)));
  }

  #[test]
  fn wrong_option_count_is_rejected() {
    let mut q = gen_question("Recursion");
    q.options.pop();
    q.correct = q.options[0].clone();
    let mut questions: Vec<GenQuestion> = (0..4).map(|_| gen_question("Recursion")).collect();
    questions.push(q);
    let err = quiz_from_generated(GenQuiz { questions }, Difficulty::Easy, &["Recursion".into()])
      .unwrap_err();
    assert!(matches!(err, TutorError::UpstreamGeneration(_)));
  }

  #[test]
  fn unmapped_concept_label_is_kept_verbatim() {
    let gen = GenQuiz { questions: (0..5).map(|_| gen_question("Dynamic Programming")).collect() };
    let quiz = quiz_from_generated(gen, Difficulty::Medium, &["Recursion".into()]).unwrap();
    assert_eq!(quiz.questions[0].concept, "Dynamic Programming");
  }
}
