//! Public request/response DTOs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.
//!
//! `QuestionOut` deliberately omits `correct` and `explanation`: graded
//! fields live only in the stored quiz and must never reach the quiz-taking
//! client before submission.

use serde::{Deserialize, Serialize};

use crate::domain::{Difficulty, Quiz, Resource};

#[derive(Serialize)]
pub struct RootOut {
    pub message: String,
}

//
// Upload / ingestion
//

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct YoutubeIn {
    pub url: String,
    pub session_id: Option<String>,
}

#[derive(Serialize)]
pub struct UploadOut {
    pub status: String,
    pub session_id: String,
    pub concepts: Vec<String>,
}

//
// Quiz generation
//

#[derive(Debug, Deserialize)]
pub struct QuizQuery {
    pub session_id: String,
    pub difficulty: Option<String>,
}

/// Client-facing question: prompt and options only.
#[derive(Serialize)]
pub struct QuestionOut {
    pub prompt: String,
    pub options: Vec<String>,
}

#[derive(Serialize)]
pub struct QuizOut {
    pub quiz_id: String,
    pub difficulty: Difficulty,
    pub questions: Vec<QuestionOut>,
}

/// Convert the stored `Quiz` (internal, carries answers) to the public DTO.
pub fn to_out(quiz: &Quiz) -> QuizOut {
    QuizOut {
        quiz_id: quiz.id.clone(),
        difficulty: quiz.difficulty,
        questions: quiz
            .questions
            .iter()
            .map(|q| QuestionOut { prompt: q.prompt.clone(), options: q.options.clone() })
            .collect(),
    }
}

//
// Quiz submission
//

#[derive(Debug, Deserialize)]
pub struct SubmitIn {
    pub session_id: String,
    pub answers: Vec<String>,
}

#[derive(Serialize)]
pub struct SubmitOut {
    pub score: u8,
    pub weak_topics: Vec<String>,
    pub feedback: String,
    pub recommendations: Vec<Resource>,
    pub next_difficulty: Difficulty,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Question;

    #[test]
    fn quiz_dto_never_carries_answers() {
        let quiz = Quiz {
            id: "q".into(),
            difficulty: Difficulty::Medium,
            questions: vec![Question {
                prompt: "Pick one".into(),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct: "secret-correct-answer".into(),
                explanation: "secret-explanation".into(),
                concept: "Recursion".into(),
            }],
        };
        let json = serde_json::to_string(&to_out(&quiz)).unwrap();
        assert!(!json.contains("secret-correct-answer"));
        assert!(!json.contains("secret-explanation"));
        assert!(json.contains("Pick one"));
    }
}
