// src/handlers/candidate.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};

use crate::{error::AppError, state::AppState, store::StoreError, utils::jwt::Claims};

/// Get the current user's candidate profile, creating it on first access.
pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let candidate = state
        .candidates
        .get_or_create(user_id)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => AppError::NotFound("Candidate not found.".to_string()),
            other => other.into(),
        })?;

    Ok(Json(candidate))
}
