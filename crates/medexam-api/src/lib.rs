//! medexam-api — JSON-over-HTTP surface for the exam assessment backend.
//!
//! All routes live under `/api/exam`. Identity arrives as the `x-user-id`
//! header from the upstream gateway; roles are resolved per request by the
//! `auth` extractor, and errors map onto HTTP statuses in `error`.

use axum::routing::{get, post};
use axum::Router;

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

pub use state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .route("/generate-question", post(routes::generate::generate_question))
        .route("/attempt/start", post(routes::attempt::start))
        .route("/attempt/:id/submit", post(routes::attempt::submit))
        .route("/attempt/:id/complete", post(routes::attempt::complete))
        .route("/analytics", get(routes::analytics::analytics))
        .route("/flag", post(routes::catalog::flag_question))
        .route("/review/:id/assign", post(routes::review::assign))
        .route("/review/:id/approve", post(routes::review::approve))
        .route("/review/:id/reject", post(routes::review::reject))
        .route("/exams", get(routes::catalog::list_exams))
        .route("/topics", get(routes::catalog::list_topics))
        .route("/questions", get(routes::catalog::list_questions))
        .route("/attempts", get(routes::catalog::list_attempts));

    Router::new().nest("/api/exam", api).with_state(state)
}
