// src/models/exam.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::question::{PublicQuestion, Question};

/// Represents the 'exams' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,
    pub title: String,
    pub description: String,

    /// Time allowed for the exam, in minutes.
    pub duration_minutes: i32,

    /// Minimum score (0-100) required to pass.
    pub pass_mark: i32,

    /// Inactive exams are visible to admins but reject submissions.
    pub is_active: bool,

    /// Number of questions, recomputed whenever a question is added.
    pub total_questions: i32,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// An exam together with its ordered questions and their ordered answers.
///
/// This is the catalog snapshot the scoring engine works on. It carries the
/// correctness flags, so it must never be serialized to a candidate directly;
/// use [`PublicExam`] for that.
#[derive(Debug, Clone)]
pub struct ExamDefinition {
    pub exam: Exam,
    pub questions: Vec<Question>,
}

impl ExamDefinition {
    pub fn question(&self, question_id: i64) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

/// DTO for sending an exam with its questions to a client.
#[derive(Debug, Serialize)]
pub struct PublicExam {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub duration_minutes: i32,
    pub pass_mark: i32,
    pub is_active: bool,
    pub total_questions: i32,
    pub questions: Vec<PublicQuestion>,
}

impl PublicExam {
    /// Builds the client projection. Correctness flags are only included
    /// when `reveal_answers` is set (admin callers).
    pub fn from_definition(definition: ExamDefinition, reveal_answers: bool) -> Self {
        let ExamDefinition { exam, questions } = definition;
        Self {
            id: exam.id,
            title: exam.title,
            description: exam.description,
            duration_minutes: exam.duration_minutes,
            pass_mark: exam.pass_mark,
            is_active: exam.is_active,
            total_questions: exam.total_questions,
            questions: questions
                .into_iter()
                .map(|q| PublicQuestion::from_question(q, reveal_answers))
                .collect(),
        }
    }
}

/// DTO for creating a new exam.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExamRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
    #[validate(range(min = 1, message = "Duration must be at least one minute."))]
    pub duration_minutes: i32,
    #[validate(range(min = 0, max = 100, message = "Pass mark must be between 0 and 100."))]
    pub pass_mark: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}
