//! Route table

use axum::routing::get;
use axum::Router;

use super::handlers;
use super::state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/students",
            get(handlers::get_students)
                .post(handlers::create_student)
                .put(handlers::update_student),
        )
        .route(
            "/api/students/:id",
            get(handlers::get_student_by_id).delete(handlers::delete_student),
        )
        .route("/health", get(handlers::health))
        .with_state(state)
}
