// src/handlers/exam.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{exam::PublicExam, result::ResultResponse, submission::SubmitExamRequest},
    state::AppState,
    utils::jwt::Claims,
};

/// Lists exams, newest first.
/// Candidates only see active exams; admins see all of them.
pub async fn list_exams(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let exams = state.catalog.list_exams(claims.is_admin()).await?;
    Ok(Json(exams))
}

/// Returns one exam with its questions and answer options.
/// Correct answers are only revealed to admins.
pub async fn get_exam(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let is_admin = claims.is_admin();

    let definition = state
        .catalog
        .load_exam(id)
        .await?
        .filter(|d| d.exam.is_active || is_admin)
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    Ok(Json(PublicExam::from_definition(definition, is_admin)))
}

/// Submits the caller's answers for an exam.
///
/// * Rejects inactive exams, incomplete or malformed answer sets and
///   second attempts.
/// * Scores the attempt and stores the result.
/// * Issues a certificate when the candidate passes.
pub async fn submit_exam(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<SubmitExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let result = state.submissions.submit(user_id, id, &req.answers).await?;

    Ok((StatusCode::CREATED, Json(ResultResponse::from(result))))
}
