//! Domain models: difficulty levels, quiz questions, evaluations, resources,
//! and the per-session state record the workflow threads data through.

use serde::{Deserialize, Serialize};

/// Quiz difficulty level. Anything unrecognized collapses to Medium.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

impl Difficulty {
  /// Parse a difficulty label, case-insensitive. Absent or unrecognized
  /// labels default to Medium.
  pub fn parse_or_default(s: Option<&str>) -> Self {
    match s.map(|s| s.trim().to_lowercase()).as_deref() {
      Some("easy") => Difficulty::Easy,
      Some("hard") => Difficulty::Hard,
      _ => Difficulty::Medium,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Difficulty::Easy => "Easy",
      Difficulty::Medium => "Medium",
      Difficulty::Hard => "Hard",
    }
  }
}

impl std::fmt::Display for Difficulty {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One multiple-choice question. `correct` must be one of `options`;
/// the LLM boundary validates this before a Question is ever stored.
/// `concept` records which extracted concept the question covers, so the
/// evaluator can attribute misses to specific weak topics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Question {
  pub prompt: String,
  pub options: Vec<String>,
  pub correct: String,
  pub explanation: String,
  pub concept: String,
}

/// A generated quiz. Immutable once stored in the session; superseded as a
/// whole by the next round. Correct answers live only here, never in the
/// client-facing DTOs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Quiz {
  pub id: String,
  pub difficulty: Difficulty,
  pub questions: Vec<Question>,
}

pub const QUIZ_LEN: usize = 5;
pub const OPTIONS_PER_QUESTION: usize = 4;

/// The outcome of grading one quiz round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Evaluation {
  /// 0..=100
  pub score: u8,
  pub weak_topics: Vec<String>,
  /// Per-question correctness, positionally aligned with the quiz.
  pub per_question: Vec<bool>,
}

/// A remedial resource for one weak topic.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Resource {
  pub topic: String,
  pub url: String,
  pub title: String,
}

/// Everything the workflow knows about one learner session.
/// Owned exclusively by the session store; mutated by each step in turn.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionState {
  pub concepts: Vec<String>,
  pub last_quiz: Option<Quiz>,
  pub last_evaluation: Option<Evaluation>,
  pub next_difficulty: Option<Difficulty>,
  /// Append-only record of past rounds.
  pub history: Vec<Evaluation>,
}
