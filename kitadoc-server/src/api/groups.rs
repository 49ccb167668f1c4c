//! Group CRUD routes

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use kitadoc_common::models::Group;
use serde_json::Value;

use super::{object_body, DeleteResponse};
use crate::error::ApiResult;
use crate::AppState;

pub async fn list_groups(State(state): State<AppState>) -> ApiResult<Json<Vec<Group>>> {
    Ok(Json(state.groups.list()?))
}

pub async fn get_group(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Group>> {
    Ok(Json(state.groups.get(&id)?))
}

pub async fn create_group(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Group>)> {
    let group = state.groups.create(object_body(body)?)?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn update_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Group>> {
    Ok(Json(state.groups.update(&id, object_body(body)?)?))
}

/// Patients referencing the group keep their `group_id`
pub async fn delete_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    state.groups.delete(&id)?;
    Ok(Json(DeleteResponse::new(format!("Group {} deleted", id))))
}

pub fn group_routes() -> Router<AppState> {
    Router::new()
        .route("/api/groups", get(list_groups).post(create_group))
        .route(
            "/api/groups/:id",
            get(get_group).patch(update_group).delete(delete_group),
        )
}
