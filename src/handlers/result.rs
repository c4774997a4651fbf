// src/handlers/result.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::result::ResultResponse,
    state::AppState,
    utils::jwt::Claims,
};

/// Lists the caller's results, most recent first. Admins get every result.
pub async fn list_results(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let results = if claims.is_admin() {
        state.results.list_all().await?
    } else {
        match state.candidates.find_by_user(claims.user_id()?).await? {
            Some(candidate) => state.results.list_for_candidate(candidate.id).await?,
            None => Vec::new(),
        }
    };

    let body: Vec<ResultResponse> = results.into_iter().map(ResultResponse::from).collect();
    Ok(Json(body))
}

/// Returns one result. Non-admins may only read their own.
pub async fn get_result(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = state
        .results
        .get(id)
        .await?
        .ok_or(AppError::NotFound("Result not found".to_string()))?;

    if !claims.is_admin() {
        let owner = state.candidates.find_by_user(claims.user_id()?).await?;
        if owner.map(|c| c.id) != Some(result.candidate_id) {
            return Err(AppError::Forbidden(
                "You do not have permission to view this result".to_string(),
            ));
        }
    }

    Ok(Json(ResultResponse::from(result)))
}
