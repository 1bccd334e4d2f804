//! HTTP endpoint handlers. These are thin wrappers that forward to the
//! workflow; each handler is instrumented and logs parameters and basic
//! result info. Errors convert to status codes via `TutorError`.

use std::sync::Arc;
use axum::extract::{Multipart, Query, State};
use axum::Json;
use tracing::{info, instrument};

use crate::error::TutorError;
use crate::protocol::*;
use crate::state::AppState;
use crate::workflow;

#[instrument(level = "info")]
pub async fn http_root() -> Json<RootOut> {
  Json(RootOut { message: "IntelliLearn API is online".into() })
}

/// `POST /upload` — multipart study material. Reads the first file field,
/// extracts concepts, and stores them in a new or existing session.
#[instrument(level = "info", skip(state, multipart), fields(has_session = q.session_id.is_some()))]
pub async fn http_upload(
  State(state): State<Arc<AppState>>,
  Query(q): Query<UploadQuery>,
  mut multipart: Multipart,
) -> Result<Json<UploadOut>, TutorError> {
  let mut text = String::new();
  while let Some(field) = multipart.next_field().await.map_err(|_| TutorError::EmptyInput)? {
    let is_file = field.file_name().is_some() || field.name() == Some("file");
    let bytes = field.bytes().await.map_err(|_| TutorError::EmptyInput)?;
    if is_file {
      text = String::from_utf8_lossy(&bytes).into_owned();
      break;
    }
  }

  let (session_id, concepts) = workflow::ingest(&state, q.session_id, &text).await?;
  info!(target: "session", session = %session_id, n_concepts = concepts.len(), "HTTP upload processed");
  Ok(Json(UploadOut { status: "success".into(), session_id, concepts }))
}

/// `POST /upload/youtube` — fetch a video transcript and ingest it like an
/// uploaded file.
#[instrument(level = "info", skip(state, body), fields(url_len = body.url.len()))]
pub async fn http_upload_youtube(
  State(state): State<Arc<AppState>>,
  Json(body): Json<YoutubeIn>,
) -> Result<Json<UploadOut>, TutorError> {
  let transcript = state.transcripts.fetch(&body.url).await?;
  let (session_id, concepts) = workflow::ingest(&state, body.session_id, &transcript).await?;
  info!(target: "session", session = %session_id, n_concepts = concepts.len(), "HTTP youtube ingestion processed");
  Ok(Json(UploadOut { status: "success".into(), session_id, concepts }))
}

/// `GET /quiz/generate?session_id=&difficulty=` — correct answers stay
/// server-side; the DTO strips them.
#[instrument(level = "info", skip(state), fields(session = %q.session_id))]
pub async fn http_quiz_generate(
  State(state): State<Arc<AppState>>,
  Query(q): Query<QuizQuery>,
) -> Result<Json<QuizOut>, TutorError> {
  let quiz = workflow::quiz_step(&state, &q.session_id, q.difficulty.as_deref()).await?;
  info!(target: "session", session = %q.session_id, quiz = %quiz.id, difficulty = %quiz.difficulty, "HTTP quiz served");
  Ok(Json(to_out(&quiz)))
}

/// `POST /quiz/submit` — grade, compose feedback, adapt difficulty, and
/// recommend resources in one shot.
#[instrument(level = "info", skip(state, body), fields(session = %body.session_id, n_answers = body.answers.len()))]
pub async fn http_quiz_submit(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SubmitIn>,
) -> Result<Json<SubmitOut>, TutorError> {
  let out = workflow::submit_step(&state, &body.session_id, &body.answers).await?;
  info!(target: "session", session = %body.session_id, score = out.score, next = %out.next_difficulty, "HTTP submission graded");
  Ok(Json(SubmitOut {
    score: out.score,
    weak_topics: out.weak_topics,
    feedback: out.feedback,
    recommendations: out.recommendations,
    next_difficulty: out.next_difficulty,
  }))
}
