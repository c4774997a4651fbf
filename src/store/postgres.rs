// src/store/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    models::{
        candidate::Candidate,
        exam::{CreateExamRequest, Exam, ExamDefinition},
        question::{Answer, CreateQuestionRequest, Question},
        result::{ExamResult, NewResult},
    },
    store::{CandidateDirectory, ExamCatalog, ResultStore, StoreError},
};

/// Postgres-backed implementation of every store trait.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps a unique-constraint violation to [`StoreError::Duplicate`].
fn map_unique_violation(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Duplicate,
        _ => StoreError::Sqlx(err),
    }
}

#[async_trait]
impl ExamCatalog for PgStore {
    async fn list_exams(&self, include_inactive: bool) -> Result<Vec<Exam>, StoreError> {
        let exams = sqlx::query_as::<_, Exam>(
            r#"
            SELECT
                id, title, description, duration_minutes, pass_mark,
                is_active, total_questions, created_at
            FROM exams
            WHERE $1 OR is_active
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        Ok(exams)
    }

    async fn load_exam(&self, exam_id: i64) -> Result<Option<ExamDefinition>, StoreError> {
        // One snapshot for the exam, its questions and its answers.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let exam = sqlx::query_as::<_, Exam>(
            r#"
            SELECT
                id, title, description, duration_minutes, pass_mark,
                is_active, total_questions, created_at
            FROM exams
            WHERE id = $1
            "#,
        )
        .bind(exam_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(exam) = exam else {
            return Ok(None);
        };

        let mut questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, exam_id, text, marks, explanation, created_at
            FROM questions
            WHERE exam_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(exam_id)
        .fetch_all(&mut *tx)
        .await?;

        let answers = sqlx::query_as::<_, Answer>(
            r#"
            SELECT a.id, a.question_id, a.text, a.is_correct
            FROM answers a
            JOIN questions q ON q.id = a.question_id
            WHERE q.exam_id = $1
            ORDER BY a.created_at, a.id
            "#,
        )
        .bind(exam_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut by_question: HashMap<i64, Vec<Answer>> = HashMap::new();
        for answer in answers {
            by_question.entry(answer.question_id).or_default().push(answer);
        }
        for question in &mut questions {
            question.answers = by_question.remove(&question.id).unwrap_or_default();
        }

        Ok(Some(ExamDefinition { exam, questions }))
    }

    async fn create_exam(&self, req: &CreateExamRequest) -> Result<Exam, StoreError> {
        let exam = sqlx::query_as::<_, Exam>(
            r#"
            INSERT INTO exams (title, description, duration_minutes, pass_mark, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING
                id, title, description, duration_minutes, pass_mark,
                is_active, total_questions, created_at
            "#,
        )
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.duration_minutes)
        .bind(req.pass_mark)
        .bind(req.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(exam)
    }

    async fn add_question(
        &self,
        exam_id: i64,
        req: &CreateQuestionRequest,
    ) -> Result<Question, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Lock the exam row so concurrent inserts recompute the count in turn.
        sqlx::query_scalar::<_, i64>("SELECT id FROM exams WHERE id = $1 FOR UPDATE")
            .bind(exam_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound)?;

        let mut question = sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (exam_id, text, marks, explanation)
            VALUES ($1, $2, $3, $4)
            RETURNING id, exam_id, text, marks, explanation, created_at
            "#,
        )
        .bind(exam_id)
        .bind(&req.text)
        .bind(req.marks)
        .bind(&req.explanation)
        .fetch_one(&mut *tx)
        .await?;

        for answer in &req.answers {
            let answer = sqlx::query_as::<_, Answer>(
                r#"
                INSERT INTO answers (question_id, text, is_correct)
                VALUES ($1, $2, $3)
                RETURNING id, question_id, text, is_correct
                "#,
            )
            .bind(question.id)
            .bind(&answer.text)
            .bind(answer.is_correct)
            .fetch_one(&mut *tx)
            .await?;
            question.answers.push(answer);
        }

        sqlx::query(
            r#"
            UPDATE exams
            SET total_questions = (SELECT COUNT(*) FROM questions WHERE exam_id = $1)
            WHERE id = $1
            "#,
        )
        .bind(exam_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(question)
    }
}

#[async_trait]
impl CandidateDirectory for PgStore {
    async fn find_by_user(&self, user_id: i64) -> Result<Option<Candidate>, StoreError> {
        let candidate = sqlx::query_as::<_, Candidate>(
            r#"
            SELECT
                c.id, c.user_id, u.first_name, u.last_name, u.email,
                c.phone, c.bio, c.is_active
            FROM candidates c
            JOIN users u ON u.id = c.user_id
            WHERE c.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(candidate)
    }

    async fn find_by_id(&self, candidate_id: i64) -> Result<Option<Candidate>, StoreError> {
        let candidate = sqlx::query_as::<_, Candidate>(
            r#"
            SELECT
                c.id, c.user_id, u.first_name, u.last_name, u.email,
                c.phone, c.bio, c.is_active
            FROM candidates c
            JOIN users u ON u.id = c.user_id
            WHERE c.id = $1
            "#,
        )
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(candidate)
    }

    async fn get_or_create(&self, user_id: i64) -> Result<Candidate, StoreError> {
        // No-op when the identity is unknown or the profile already exists.
        sqlx::query(
            r#"
            INSERT INTO candidates (user_id)
            SELECT id FROM users WHERE id = $1
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        self.find_by_user(user_id).await?.ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl ResultStore for PgStore {
    async fn find_attempt(
        &self,
        candidate_id: i64,
        exam_id: i64,
    ) -> Result<Option<ExamResult>, StoreError> {
        let result = sqlx::query_as::<_, ExamResult>(
            r#"
            SELECT id, candidate_id, exam_id, score, is_passed, completed_at, certificate_path
            FROM results
            WHERE candidate_id = $1 AND exam_id = $2
            "#,
        )
        .bind(candidate_id)
        .bind(exam_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    async fn insert(&self, new: &NewResult) -> Result<ExamResult, StoreError> {
        // The (candidate_id, exam_id) unique constraint decides who wins a race.
        let inserted = sqlx::query_as::<_, ExamResult>(
            r#"
            INSERT INTO results (candidate_id, exam_id, score, is_passed, completed_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (candidate_id, exam_id) DO NOTHING
            RETURNING id, candidate_id, exam_id, score, is_passed, completed_at, certificate_path
            "#,
        )
        .bind(new.candidate_id)
        .bind(new.exam_id)
        .bind(new.score)
        .bind(new.is_passed)
        .bind(new.completed_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        inserted.ok_or(StoreError::Duplicate)
    }

    async fn get(&self, result_id: i64) -> Result<Option<ExamResult>, StoreError> {
        let result = sqlx::query_as::<_, ExamResult>(
            r#"
            SELECT id, candidate_id, exam_id, score, is_passed, completed_at, certificate_path
            FROM results
            WHERE id = $1
            "#,
        )
        .bind(result_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    async fn list_for_candidate(&self, candidate_id: i64) -> Result<Vec<ExamResult>, StoreError> {
        let results = sqlx::query_as::<_, ExamResult>(
            r#"
            SELECT id, candidate_id, exam_id, score, is_passed, completed_at, certificate_path
            FROM results
            WHERE candidate_id = $1
            ORDER BY completed_at DESC, id DESC
            "#,
        )
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }

    async fn list_all(&self) -> Result<Vec<ExamResult>, StoreError> {
        let results = sqlx::query_as::<_, ExamResult>(
            r#"
            SELECT id, candidate_id, exam_id, score, is_passed, completed_at, certificate_path
            FROM results
            ORDER BY completed_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }

    async fn set_certificate_path(&self, result_id: i64, path: &str) -> Result<(), StoreError> {
        let updated = sqlx::query("UPDATE results SET certificate_path = $2 WHERE id = $1")
            .bind(result_id)
            .bind(path)
            .execute(&self.pool)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }
}
