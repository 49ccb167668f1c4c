//! kitadoc-server library - childcare documentation backend
//!
//! JSON CRUD for patients, groups and documentation records plus the
//! audio → transcript → bullet point pipeline.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use kitadoc_common::store::{DocumentationStore, GroupStore, PatientStore};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod pipeline;

use pipeline::AudioPipeline;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub patients: Arc<PatientStore>,
    pub groups: Arc<GroupStore>,
    pub documentation: Arc<DocumentationStore>,
    pub pipeline: Arc<AudioPipeline>,
    pub startup_time: Instant,
}

impl AppState {
    pub fn new(
        patients: PatientStore,
        groups: GroupStore,
        documentation: DocumentationStore,
        pipeline: AudioPipeline,
    ) -> Self {
        Self {
            patients: Arc::new(patients),
            groups: Arc::new(groups),
            documentation: Arc::new(documentation),
            pipeline: Arc::new(pipeline),
            startup_time: Instant::now(),
        }
    }

    /// All stores in memory, for tests and throwaway instances
    pub fn in_memory(pipeline: AudioPipeline) -> Self {
        Self::new(
            PatientStore::in_memory(),
            GroupStore::in_memory(),
            DocumentationStore::in_memory(),
            pipeline,
        )
    }
}

/// Build application router
///
/// `max_upload_bytes` bounds every request body, audio uploads included.
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::patient_routes())
        .merge(api::group_routes())
        .merge(api::documentation_routes())
        .merge(api::audio_routes())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
