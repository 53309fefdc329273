//! Student route handlers

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;
use serde_json::json;

use super::error::ApiError;
use super::response::{respond, Envelope};
use super::state::AppState;
use crate::storage::{NewStudent, Student};

/// Request body for create and update.
///
/// Absent fields decode to their zero value and are then rejected by
/// [`Student::validate`], so `{}` yields every "required" message at once.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct StudentPayload {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: i32,
}

impl StudentPayload {
    fn decode(body: &Bytes) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ApiError::EmptyBody);
        }
        serde_json::from_slice(body).map_err(|e| ApiError::MalformedJson(e.to_string()))
    }
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| ApiError::InvalidId)
}

/// `POST /api/students`
pub(crate) async fn create_student(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let payload = StudentPayload::decode(&body)?;
    let student = NewStudent::new(payload.name, payload.email, payload.age);
    student.validate().map_err(ApiError::Validation)?;

    let id = state
        .storage
        .create_student(&student)
        .await
        .map_err(|e| state.api_error(e))?;

    tracing::info!(id, "Student created");
    Ok(respond(StatusCode::CREATED, Envelope::ok(json!({ "id": id }))))
}

/// `GET /api/students/{id}`
pub(crate) async fn get_student_by_id(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&raw_id)?;
    tracing::debug!(id, "Getting student");

    let student = state
        .storage
        .get_student_by_id(id)
        .await
        .map_err(|e| state.api_error(e))?;

    Ok(respond(StatusCode::OK, Envelope::ok(student)))
}

/// `GET /api/students`
pub(crate) async fn get_students(State(state): State<AppState>) -> Result<Response, ApiError> {
    let students = state
        .storage
        .get_students()
        .await
        .map_err(|e| state.api_error(e))?;

    Ok(respond(StatusCode::OK, Envelope::ok(students)))
}

/// `PUT /api/students`
///
/// Returns the row as re-read after the update. The update and the re-read
/// are separate round trips, so a concurrent writer may land in between.
pub(crate) async fn update_student(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let payload = StudentPayload::decode(&body)?;
    let student = Student::new(payload.id, payload.name, payload.email, payload.age);
    student.validate().map_err(ApiError::Validation)?;
    if student.id <= 0 {
        return Err(ApiError::MissingId);
    }

    let affected = state
        .storage
        .update_student(&student)
        .await
        .map_err(|e| state.api_error(e))?;
    if affected == 0 {
        return Err(ApiError::NotFound(student.id));
    }

    let updated = state
        .storage
        .get_student_by_id(student.id)
        .await
        .map_err(|e| state.api_error(e))?;

    tracing::info!(id = updated.id, "Student updated");
    Ok(respond(StatusCode::OK, Envelope::ok(updated)))
}

/// `DELETE /api/students/{id}`
pub(crate) async fn delete_student(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&raw_id)?;

    let deleted = state
        .storage
        .delete_student(id)
        .await
        .map_err(|e| state.api_error(e))?;

    tracing::info!(id = deleted, "Student deleted");
    Ok(respond(StatusCode::OK, Envelope::ok(json!({ "id": deleted }))))
}

/// `GET /health`
pub(crate) async fn health(State(state): State<AppState>) -> Response {
    respond(
        StatusCode::OK,
        Envelope::ok(json!({ "backend": state.storage.backend_name() })),
    )
}
