//! Audio upload route

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    routing::post,
    Json, Router,
};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::pipeline::{PipelineResponse, TempAudioFile};
use crate::AppState;

/// Multipart field carrying the recording
pub const AUDIO_FIELD: &str = "audio";

/// POST /api/ai/upload-audio
///
/// Transcribes the `audio` field and summarizes it into bullet points.
/// Other fields are ignored.
pub async fn upload_audio(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<PipelineResponse>> {
    let mut multipart = multipart?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AUDIO_FIELD) {
            debug!(field = ?field.name(), "Ignoring multipart field");
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        let file = TempAudioFile::write(state.pipeline.upload_dir(), file_name.as_deref(), &bytes)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to store audio upload: {}", e)))?;
        upload = Some(file);
        break;
    }

    let Some(upload) = upload else {
        return Err(ApiError::BadRequest("No audio file uploaded".to_string()));
    };

    Ok(Json(state.pipeline.process(upload).await?))
}

pub fn audio_routes() -> Router<AppState> {
    Router::new().route("/api/ai/upload-audio", post(upload_audio))
}
