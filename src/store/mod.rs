//! Persistence seams for the submission pipeline.
//!
//! The core talks to three collaborators: the exam catalog, the candidate
//! directory and the result store. [`PgStore`] backs all three with Postgres;
//! [`MemoryStore`] keeps everything in process for tests and local runs.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    candidate::Candidate,
    exam::{CreateExamRequest, Exam, ExamDefinition},
    question::{CreateQuestionRequest, Question},
    result::{ExamResult, NewResult},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("record not found")]
    NotFound,

    /// A unique constraint rejected the write.
    #[error("duplicate record")]
    Duplicate,
}

/// Read access to exams, plus the thin authoring surface used to seed them.
#[async_trait]
pub trait ExamCatalog: Send + Sync {
    /// Lists exams, newest first.
    async fn list_exams(&self, include_inactive: bool) -> Result<Vec<Exam>, StoreError>;

    /// Loads an exam with its ordered questions and answers.
    async fn load_exam(&self, exam_id: i64) -> Result<Option<ExamDefinition>, StoreError>;

    async fn create_exam(&self, req: &CreateExamRequest) -> Result<Exam, StoreError>;

    /// Adds a question with its answers and recomputes the exam's
    /// `total_questions`. Fails with [`StoreError::NotFound`] for an unknown exam.
    async fn add_question(
        &self,
        exam_id: i64,
        req: &CreateQuestionRequest,
    ) -> Result<Question, StoreError>;
}

/// Maps identities to candidate profiles.
#[async_trait]
pub trait CandidateDirectory: Send + Sync {
    async fn find_by_user(&self, user_id: i64) -> Result<Option<Candidate>, StoreError>;

    async fn find_by_id(&self, candidate_id: i64) -> Result<Option<Candidate>, StoreError>;

    /// Returns the profile for `user_id`, creating an empty one if the
    /// identity exists but has no profile yet. Fails with
    /// [`StoreError::NotFound`] when the identity itself is unknown.
    async fn get_or_create(&self, user_id: i64) -> Result<Candidate, StoreError>;
}

/// Stores at most one result per (candidate, exam).
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn find_attempt(
        &self,
        candidate_id: i64,
        exam_id: i64,
    ) -> Result<Option<ExamResult>, StoreError>;

    /// Inserts a result. A second row for the same (candidate, exam) fails
    /// with [`StoreError::Duplicate`]; the existing row is left untouched.
    async fn insert(&self, new: &NewResult) -> Result<ExamResult, StoreError>;

    async fn get(&self, result_id: i64) -> Result<Option<ExamResult>, StoreError>;

    /// Results of one candidate, most recent first.
    async fn list_for_candidate(&self, candidate_id: i64) -> Result<Vec<ExamResult>, StoreError>;

    /// All results, most recent first.
    async fn list_all(&self) -> Result<Vec<ExamResult>, StoreError>;

    /// Records the certificate path. This is the only column a result
    /// accepts after insert.
    async fn set_certificate_path(&self, result_id: i64, path: &str) -> Result<(), StoreError>;
}
