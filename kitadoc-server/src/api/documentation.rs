//! Documentation CRUD routes

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use kitadoc_common::models::Documentation;
use kitadoc_common::store::DocumentationFilter;
use serde_json::Value;

use super::{object_body, DeleteResponse};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /api/documentation?patient_id=...&documentation_id=...
pub async fn list_documentation(
    State(state): State<AppState>,
    filter: Result<Query<DocumentationFilter>, QueryRejection>,
) -> ApiResult<Json<Vec<Documentation>>> {
    let Query(filter) = filter.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    Ok(Json(state.documentation.list(&filter)?))
}

/// GET /api/documentation/:id
pub async fn get_documentation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Documentation>> {
    Ok(Json(state.documentation.get(&id)?))
}

/// POST /api/documentation
pub async fn create_documentation(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Documentation>)> {
    let doc = state.documentation.create(object_body(body)?)?;
    Ok((StatusCode::CREATED, Json(doc)))
}

/// PATCH /api/documentation/:id
pub async fn update_documentation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Documentation>> {
    Ok(Json(state.documentation.update(&id, object_body(body)?)?))
}

/// DELETE /api/documentation/:id
pub async fn delete_documentation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    state.documentation.delete(&id)?;
    Ok(Json(DeleteResponse::new(format!("Documentation {} deleted", id))))
}

pub fn documentation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/documentation",
            get(list_documentation).post(create_documentation),
        )
        .route(
            "/api/documentation/:id",
            get(get_documentation)
                .patch(update_documentation)
                .delete(delete_documentation),
        )
}
