// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub exam_id: i64,

    /// The text content of the question.
    pub text: String,

    /// Mark weight. Stored for authoring; scoring counts every question once.
    pub marks: i32,

    /// Explanation of the correct answer, shown to admins only.
    pub explanation: String,

    pub created_at: chrono::DateTime<chrono::Utc>,

    /// Answer options in display order. Loaded separately from 'answers'.
    #[sqlx(skip)]
    #[serde(default)]
    pub answers: Vec<Answer>,
}

/// Represents the 'answers' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
    pub is_correct: bool,
}

/// DTO for sending a question to a client.
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub text: String,
    pub marks: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub answers: Vec<PublicAnswer>,
}

/// DTO for an answer option; `is_correct` is omitted for candidates.
#[derive(Debug, Serialize)]
pub struct PublicAnswer {
    pub id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

impl PublicQuestion {
    pub fn from_question(question: Question, reveal_answers: bool) -> Self {
        Self {
            id: question.id,
            text: question.text,
            marks: question.marks,
            explanation: reveal_answers.then_some(question.explanation),
            answers: question
                .answers
                .into_iter()
                .map(|a| PublicAnswer {
                    id: a.id,
                    text: a.text,
                    is_correct: reveal_answers.then_some(a.is_correct),
                })
                .collect(),
        }
    }
}

/// DTO for creating a new question with its answer options.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
    #[serde(default = "default_marks")]
    #[validate(range(min = 1))]
    pub marks: i32,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub explanation: String,
    #[validate(length(min = 1, message = "A question needs at least one answer."))]
    #[validate(nested)]
    pub answers: Vec<CreateAnswerRequest>,
}

/// DTO for one answer option inside [`CreateQuestionRequest`].
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateAnswerRequest {
    #[validate(length(min = 1, max = 500))]
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

impl CreateQuestionRequest {
    pub fn correct_answer_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_correct).count()
    }
}

fn default_marks() -> i32 {
    1
}
