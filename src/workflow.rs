//! The session workflow: Ingestion -> Quiz -> Evaluation -> Feedback ->
//! Resources, threaded through the session store, plus the pure pieces it
//! is built from (grading, the difficulty-adaptation rule, local fallbacks).
//!
//! Validation errors reject before any session mutation. Grading is fully
//! local and deterministic; the LLM only supplies generation, extraction,
//! and feedback prose.

use rand::seq::SliceRandom;
use tracing::{error, info, instrument};

use crate::domain::{
  Difficulty, Evaluation, Question, Quiz, Resource, OPTIONS_PER_QUESTION, QUIZ_LEN,
};
use crate::error::TutorError;
use crate::extract;
use crate::resources::find_resources;
use crate::state::AppState;
use crate::util::normalize_answer;
use uuid::Uuid;

/// Everything `POST /quiz/submit` reports back for one graded round.
#[derive(Debug)]
pub struct SubmitOutcome {
  pub score: u8,
  pub weak_topics: Vec<String>,
  pub feedback: String,
  pub recommendations: Vec<Resource>,
  pub next_difficulty: Difficulty,
}

// -------- Orchestration steps --------

/// Ingestion step: extract concepts from material and store them, creating
/// the session if needed. Resets any quiz/evaluation from prior material;
/// history and the adapted difficulty survive re-ingestion.
#[instrument(level = "info", skip(state, text), fields(text_len = text.len(), has_session = session_id.is_some()))]
pub async fn ingest(
  state: &AppState,
  session_id: Option<String>,
  text: &str,
) -> Result<(String, Vec<String>), TutorError> {
  let concepts = extract::extract_concepts(state.llm.as_ref(), &state.prompts, text).await?;

  let id = state.store.create(session_id).await;
  let stored = concepts.clone();
  state
    .store
    .update(
      &id,
      Box::new(move |s| {
        s.concepts = stored;
        s.last_quiz = None;
        s.last_evaluation = None;
      }),
    )
    .await?;

  info!(target: "session", session = %id, n_concepts = concepts.len(), "Material ingested");
  Ok((id, concepts))
}

/// Quiz step: generate a quiz from the stored concepts at either the
/// requested difficulty or the adapted one (default Medium), then persist it
/// as the session's active quiz.
#[instrument(level = "info", skip(state), fields(session = %session_id))]
pub async fn quiz_step(
  state: &AppState,
  session_id: &str,
  requested: Option<&str>,
) -> Result<Quiz, TutorError> {
  let session = state.store.get(session_id).await?;
  if session.concepts.is_empty() {
    return Err(TutorError::InsufficientContext);
  }

  let difficulty = match requested {
    Some(s) if !s.trim().is_empty() => Difficulty::parse_or_default(Some(s)),
    _ => session.next_difficulty.unwrap_or(Difficulty::Medium),
  };

  let quiz = match &state.llm {
    Some(llm) => llm.generate_quiz(&state.prompts, &session.concepts, difficulty).await?,
    None => local_quiz(&session.concepts, difficulty),
  };

  let stored = quiz.clone();
  state
    .store
    .update(
      session_id,
      Box::new(move |s| {
        s.last_quiz = Some(stored);
        s.last_evaluation = None;
      }),
    )
    .await?;

  info!(target: "session", session = %session_id, quiz = %quiz.id, %difficulty, "Quiz generated and stored");
  Ok(quiz)
}

/// Submit step: grade the active quiz, compose feedback, pick the next
/// difficulty, look up remedial resources, and persist the round.
#[instrument(level = "info", skip(state, answers), fields(session = %session_id, n_answers = answers.len()))]
pub async fn submit_step(
  state: &AppState,
  session_id: &str,
  answers: &[String],
) -> Result<SubmitOutcome, TutorError> {
  let session = state.store.get(session_id).await?;
  let quiz = session.last_quiz.ok_or(TutorError::NoActiveQuiz)?;

  let evaluation = evaluate(&quiz, answers)?;
  let next = next_difficulty(evaluation.score);

  // Feedback prose degrades to the local composer if the model misbehaves;
  // the difficulty rule and the score are already settled at this point.
  let feedback = match &state.llm {
    Some(llm) => {
      match llm
        .feedback_text(&state.prompts, evaluation.score, quiz.difficulty, &evaluation.weak_topics)
        .await
      {
        Ok(t) if !t.trim().is_empty() => t,
        Ok(_) => local_feedback(evaluation.score, &evaluation.weak_topics, next),
        Err(e) => {
          error!(target: "tutor", error = %e, "LLM feedback failed; using local composer");
          local_feedback(evaluation.score, &evaluation.weak_topics, next)
        }
      }
    }
    None => local_feedback(evaluation.score, &evaluation.weak_topics, next),
  };

  let recommendations = find_resources(&evaluation.weak_topics);

  let stored = evaluation.clone();
  state
    .store
    .update(
      session_id,
      Box::new(move |s| {
        s.last_evaluation = Some(stored.clone());
        s.next_difficulty = Some(next);
        s.history.push(stored);
      }),
    )
    .await?;

  info!(target: "session", session = %session_id, score = evaluation.score, next = %next, "Round graded");
  Ok(SubmitOutcome {
    score: evaluation.score,
    weak_topics: evaluation.weak_topics,
    feedback,
    recommendations,
    next_difficulty: next,
  })
}

// -------- Pure pieces --------

/// Grade an answer set against a quiz. Exact match per position after
/// trimming and lowercasing; no partial credit.
pub fn evaluate(quiz: &Quiz, answers: &[String]) -> Result<Evaluation, TutorError> {
  if answers.len() != quiz.questions.len() {
    return Err(TutorError::LengthMismatch {
      expected: quiz.questions.len(),
      got: answers.len(),
    });
  }

  let per_question: Vec<bool> = quiz
    .questions
    .iter()
    .zip(answers)
    .map(|(q, a)| normalize_answer(a) == normalize_answer(&q.correct))
    .collect();

  let correct_count = per_question.iter().filter(|&&ok| ok).count();
  let score = (100.0 * correct_count as f64 / quiz.questions.len() as f64).round() as u8;

  let mut weak_topics: Vec<String> = Vec::new();
  for (q, ok) in quiz.questions.iter().zip(&per_question) {
    if !ok && !weak_topics.iter().any(|t| t.eq_ignore_ascii_case(&q.concept)) {
      weak_topics.push(q.concept.clone());
    }
  }

  Ok(Evaluation { score, weak_topics, per_question })
}

/// The adaptation rule. The boundary is intentionally asymmetric: 80 falls
/// through to Medium while 81 goes Hard.
pub fn next_difficulty(score: u8) -> Difficulty {
  if score > 80 {
    Difficulty::Hard
  } else if score < 50 {
    Difficulty::Easy
  } else {
    Difficulty::Medium
  }
}

/// Offline quiz generator: one templated question per concept, round-robin,
/// options shuffled. Keeps the full loop testable without an API key.
pub fn local_quiz(concepts: &[String], difficulty: Difficulty) -> Quiz {
  let mut rng = rand::thread_rng();
  let mut questions = Vec::with_capacity(QUIZ_LEN);

  for i in 0..QUIZ_LEN {
    let concept = &concepts[i % concepts.len()];
    let correct = format!("{} is covered by the study material", concept);
    let mut options = vec![
      correct.clone(),
      format!("{} is unrelated to the material", concept),
      "None of the material mentions this".to_string(),
      "The material contradicts this idea".to_string(),
    ];
    debug_assert_eq!(options.len(), OPTIONS_PER_QUESTION);
    options.shuffle(&mut rng);

    questions.push(Question {
      prompt: format!("Which statement about \"{}\" matches the material?", concept),
      options,
      correct,
      explanation: format!("\"{}\" was extracted as a core concept.", concept),
      concept: concept.clone(),
    });
  }

  Quiz { id: Uuid::new_v4().to_string(), difficulty, questions }
}

/// Deterministic feedback composer used when no LLM is configured (or when
/// the model call fails).
pub fn local_feedback(score: u8, weak_topics: &[String], next: Difficulty) -> String {
  let opening = match score {
    81..=100 => "Excellent work!",
    50..=80 => "Good effort — you're getting there.",
    _ => "Don't worry, this takes practice.",
  };
  if weak_topics.is_empty() {
    format!(
      "{} You scored {}/100 with no weak topics. The next quiz will be {}.",
      opening, score, next
    )
  } else {
    format!(
      "{} You scored {}/100. Review these topics before the next round: {}. The next quiz will be {}.",
      opening,
      score,
      weak_topics.join(", "),
      next
    )
  }
}
