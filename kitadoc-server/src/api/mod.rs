//! HTTP API handlers for kitadoc-server

pub mod audio;
pub mod documentation;
pub mod groups;
pub mod health;
pub mod patients;

pub use audio::audio_routes;
pub use documentation::documentation_routes;
pub use groups::group_routes;
pub use health::health_routes;
pub use patients::patient_routes;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use kitadoc_common::store::Fields;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// Body returned by every DELETE route
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

impl DeleteResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Unwrap a JSON body that must be an object
pub(crate) fn object_body(body: Result<Json<Value>, JsonRejection>) -> ApiResult<Fields> {
    let Json(value) = body?;
    match value {
        Value::Object(fields) => Ok(fields),
        _ => Err(ApiError::BadRequest("Request body must be a JSON object".to_string())),
    }
}
