// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        exam::CreateExamRequest,
        question::{CreateQuestionRequest, PublicQuestion},
        result::ResultResponse,
    },
    state::AppState,
    store::StoreError,
};

/// Creates a new exam.
/// Admin only.
pub async fn create_exam(
    State(state): State<AppState>,
    Json(payload): Json<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let exam = state.catalog.create_exam(&payload).await.map_err(|e| {
        tracing::error!("Failed to create exam: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!(exam_id = exam.id, title = %exam.title, "Exam created");
    Ok((StatusCode::CREATED, Json(exam)))
}

/// Adds a question, with its answer options, to an exam.
/// Admin only. Keeps the exam's question count in step.
pub async fn create_question(
    State(state): State<AppState>,
    Path(exam_id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    // Scoring tolerates zero or several correct answers, but it is almost
    // always an authoring mistake.
    let correct = payload.correct_answer_count();
    if correct != 1 {
        tracing::warn!(exam_id, correct, "Question does not have exactly one correct answer");
    }

    let question = state
        .catalog
        .add_question(exam_id, &payload)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => AppError::NotFound("Exam not found".to_string()),
            other => {
                tracing::error!("Failed to create question: {:?}", other);
                other.into()
            }
        })?;

    Ok((
        StatusCode::CREATED,
        Json(PublicQuestion::from_question(question, true)),
    ))
}

/// Regenerates the certificate of a passed result.
/// Admin only. Used when the certificate could not be written at submission.
pub async fn regenerate_certificate(
    State(state): State<AppState>,
    Path(result_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.submissions.regenerate_certificate(result_id).await?;
    Ok(Json(ResultResponse::from(result)))
}
