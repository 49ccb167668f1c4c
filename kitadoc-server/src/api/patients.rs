//! Patient CRUD routes

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use kitadoc_common::models::Patient;
use serde_json::Value;

use super::{object_body, DeleteResponse};
use crate::error::ApiResult;
use crate::AppState;

/// GET /api/patients
pub async fn list_patients(State(state): State<AppState>) -> ApiResult<Json<Vec<Patient>>> {
    Ok(Json(state.patients.list()?))
}

/// GET /api/patients/:id
pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Patient>> {
    Ok(Json(state.patients.get(&id)?))
}

/// POST /api/patients
pub async fn create_patient(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Patient>)> {
    let patient = state.patients.create(object_body(body)?)?;
    Ok((StatusCode::CREATED, Json(patient)))
}

/// PATCH /api/patients/:id
pub async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Patient>> {
    Ok(Json(state.patients.update(&id, object_body(body)?)?))
}

/// DELETE /api/patients/:id
pub async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    state.patients.delete(&id)?;
    Ok(Json(DeleteResponse::new(format!("Patient {} deleted", id))))
}

pub fn patient_routes() -> Router<AppState> {
    Router::new()
        .route("/api/patients", get(list_patients).post(create_patient))
        .route(
            "/api/patients/:id",
            get(get_patient).patch(update_patient).delete(delete_patient),
        )
}
