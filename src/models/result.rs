// src/models/result.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'results' table in the database.
///
/// One row per (candidate, exam). Rows are never updated except for
/// `certificate_path`, which the certificate step fills in after insert.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ExamResult {
    pub id: i64,
    pub candidate_id: i64,
    pub exam_id: i64,

    /// Percentage of correctly answered questions, 0.0 to 100.0.
    pub score: f64,

    pub is_passed: bool,
    pub completed_at: DateTime<Utc>,

    /// Relative path of the generated certificate, if any.
    pub certificate_path: Option<String>,
}

/// Values for inserting a new result row.
#[derive(Debug, Clone)]
pub struct NewResult {
    pub candidate_id: i64,
    pub exam_id: i64,
    pub score: f64,
    pub is_passed: bool,
    pub completed_at: DateTime<Utc>,
}

/// DTO returned to clients for a result.
#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub id: i64,
    pub candidate: i64,
    pub exam: i64,
    /// Rounded to one decimal place.
    pub score: f64,
    pub is_passed: bool,
    pub completed_at: DateTime<Utc>,
    pub certificate_path: Option<String>,
}

impl From<ExamResult> for ResultResponse {
    fn from(result: ExamResult) -> Self {
        Self {
            id: result.id,
            candidate: result.candidate_id,
            exam: result.exam_id,
            score: (result.score * 10.0).round() / 10.0,
            is_passed: result.is_passed,
            completed_at: result.completed_at,
            certificate_path: result.certificate_path,
        }
    }
}
