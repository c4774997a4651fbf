// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, candidate, exam, result},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (exams, results, candidates, admin).
/// * Every route requires a bearer token; admin routes also require the admin role.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let exam_routes = Router::new()
        .route("/", get(exam::list_exams))
        .route("/{id}", get(exam::get_exam))
        .route("/{id}/submit", post(exam::submit_exam));

    let result_routes = Router::new()
        .route("/", get(result::list_results))
        .route("/{id}", get(result::get_result));

    let candidate_routes = Router::new().route("/me", get(candidate::get_me));

    let admin_routes = Router::new()
        .route("/exams", post(admin::create_exam))
        .route("/exams/{id}/questions", post(admin::create_question))
        .route(
            "/results/{id}/certificate",
            post(admin::regenerate_certificate),
        )
        .route_layer(middleware::from_fn(admin_middleware));

    let api = Router::new()
        .nest("/exams", exam_routes)
        .nest("/results", result_routes)
        .nest("/candidates", candidate_routes)
        .nest("/admin", admin_routes)
        // Auth runs before the admin check (layers apply outside in)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api", api)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
