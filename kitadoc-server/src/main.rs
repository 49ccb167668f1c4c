//! kitadoc-server - childcare documentation backend
//!
//! Serves the patient, group and documentation APIs and the audio
//! summarization pipeline for the KitaDoc frontend.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use kitadoc_common::config::{
    self, collection_path, ensure_directory_exists, StorageMode, TomlConfig,
};
use kitadoc_common::store::{
    DocumentationStore, GroupStore, JsonFilePersistence, MemoryPersistence, PatientStore, Persistence,
};
use kitadoc_server::pipeline::AudioPipeline;
use kitadoc_server::{build_router, AppState};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for kitadoc-server
#[derive(Parser, Debug)]
#[command(name = "kitadoc-server")]
#[command(about = "Childcare documentation backend")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "KITADOC_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "KITADOC_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long, env = "KITADOC_BIND")]
    bind: Option<String>,

    /// Folder holding the JSON collections
    #[arg(short, long, env = "KITADOC_DATA_FOLDER")]
    data_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config before tracing so the configured level applies; load warnings are replayed below
    let config_path = args.config.clone().or_else(config::default_config_path);
    let config_result = match &config_path {
        Some(path) if path.exists() => config::load_toml_config(path),
        _ => Ok(TomlConfig::default()),
    };
    let log_level = config_result
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},tower_http=debug", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting KitaDoc server (kitadoc-server) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let toml_config = match config_result {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config: {}", e);
            return Err(e.into());
        }
    };
    match &config_path {
        Some(path) if path.exists() => info!("Config file: {}", path.display()),
        Some(path) => warn!("Config file {} not found, using defaults", path.display()),
        None => info!("No config directory on this platform, using defaults"),
    }

    let data_folder = config::resolve_data_folder(args.data_folder.as_deref(), &toml_config);
    ensure_directory_exists(&data_folder)
        .with_context(|| format!("Failed to initialize data folder {}", data_folder.display()))?;
    info!("Data folder: {}", data_folder.display());

    let storage = &toml_config.storage;
    let patients = PatientStore::new(persistence(&data_folder, "patients", storage.patients));
    let groups = GroupStore::new(persistence(&data_folder, "groups", storage.groups));
    let documentation =
        DocumentationStore::new(persistence(&data_folder, "documentation", storage.documentation));
    info!("Patients: {}", patients.describe());
    info!("Groups: {}", groups.describe());
    info!("Documentation: {}", documentation.describe());

    if storage.seed_default_groups {
        let seeded = groups.seed_defaults().context("Failed to seed default groups")?;
        if seeded > 0 {
            info!("Created {} default groups", seeded);
        }
    }

    let pipeline = AudioPipeline::from_config(&toml_config.transcription, &toml_config.summarization);
    info!(
        "Transcription: {} {}",
        toml_config.transcription.program,
        toml_config.transcription.args.join(" ")
    );
    info!(
        "Summarization: {} {}",
        toml_config.summarization.program,
        toml_config.summarization.args.join(" ")
    );

    let state = AppState::new(patients, groups, documentation, pipeline);
    let app = build_router(state, toml_config.upload.max_bytes);

    let bind = args.bind.unwrap_or(toml_config.server.bind);
    let port = args.port.unwrap_or(toml_config.server.port);
    let addr = format!("{}:{}", bind, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("kitadoc-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// JSON file under `data_folder`, or memory only
fn persistence<T>(data_folder: &Path, collection: &str, mode: StorageMode) -> Arc<dyn Persistence<T>>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    match mode {
        StorageMode::File => Arc::new(JsonFilePersistence::<T>::new(collection_path(data_folder, collection))),
        StorageMode::Memory => Arc::new(MemoryPersistence::<T>::new()),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
