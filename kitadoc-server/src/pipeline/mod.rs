//! Audio → transcript → bullet points
//!
//! A submission moves through:
//!
//! ```text
//! Received → Transcribing → Transcribed → Summarizing → Summarized | SummarizeFailed → Responded
//!                        ↘ TranscribeFailed
//! ```
//!
//! What a stage failure means for the request is looked up in
//! [`policy_for`]. Each submission spawns its own processes; there is no
//! queue and no concurrency cap.

pub mod summarize;
pub mod temp_file;
pub mod tool;
pub mod transcribe;

use std::path::{Path, PathBuf};

use kitadoc_common::config::ToolConfig;
use kitadoc_common::time;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub use summarize::{SummarizationError, SummarizationResult, Summarizer};
pub use temp_file::TempAudioFile;
pub use tool::{ToolCommand, ToolError};
pub use transcribe::{TranscriptionError, TranscriptionResult, Transcriber};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Transcription,
    Summarization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Fail the request
    Abort,
    /// Continue with a substitute result
    Degrade,
}

/// Failure policy table
pub fn policy_for(stage: Stage) -> FailurePolicy {
    match stage {
        Stage::Transcription => FailurePolicy::Abort,
        Stage::Summarization => FailurePolicy::Degrade,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Received,
    Transcribing,
    Transcribed,
    Summarizing,
    Summarized,
    SummarizeFailed,
    TranscribeFailed,
    Responded,
}

/// Tracks one submission through [`PipelineState`]
struct Submission {
    id: Uuid,
    state: PipelineState,
}

impl Submission {
    fn new() -> Self {
        let submission = Self {
            id: Uuid::new_v4(),
            state: PipelineState::Received,
        };
        debug!(submission = %submission.id, state = ?submission.state, "Pipeline state");
        submission
    }

    fn advance(&mut self, next: PipelineState) {
        debug!(submission = %self.id, from = ?self.state, to = ?next, "Pipeline state");
        self.state = next;
    }
}

/// Body of a successful upload response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResponse {
    pub success: bool,
    pub bullet_points: Vec<String>,
    pub transcription: String,
    /// ISO 8601, UTC
    pub timestamp: String,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Transcription failed")]
    Transcription(#[source] TranscriptionError),

    #[error("Summarization failed")]
    Summarization(#[source] SummarizationError),
}

impl PipelineError {
    /// Diagnostic text returned to the client next to the error message
    pub fn details(&self) -> String {
        match self {
            PipelineError::Transcription(e) => e.details(),
            PipelineError::Summarization(e) => e.to_string(),
        }
    }
}

pub struct AudioPipeline {
    transcriber: Transcriber,
    summarizer: Summarizer,
    upload_dir: PathBuf,
}

impl AudioPipeline {
    pub fn new(transcriber: Transcriber, summarizer: Summarizer) -> Self {
        Self {
            transcriber,
            summarizer,
            upload_dir: std::env::temp_dir(),
        }
    }

    pub fn from_config(transcription: &ToolConfig, summarization: &ToolConfig) -> Self {
        Self::new(
            Transcriber::new(ToolCommand::from(transcription)),
            Summarizer::new(ToolCommand::from(summarization)),
        )
    }

    /// Directory for uploaded audio; defaults to the system temp dir
    pub fn with_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = dir.into();
        self
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Run both stages for an uploaded file
    ///
    /// The audio file is deleted once transcription has finished, whatever
    /// its outcome.
    pub async fn process(&self, audio: TempAudioFile) -> Result<PipelineResponse, PipelineError> {
        let mut submission = Submission::new();
        info!(submission = %submission.id, path = %audio.path().display(), "Audio received");

        submission.advance(PipelineState::Transcribing);
        let transcribed = self.transcriber.transcribe(audio.path()).await;
        if let Err(e) = audio.remove().await {
            warn!(submission = %submission.id, "Failed to remove audio upload: {}", e);
        }

        let transcription = match transcribed {
            Ok(result) => {
                submission.advance(PipelineState::Transcribed);
                debug!(
                    submission = %submission.id,
                    stripped = result.stripped_chars(),
                    "Transcript cleaned"
                );
                result
            }
            Err(e) => {
                submission.advance(PipelineState::TranscribeFailed);
                match policy_for(Stage::Transcription) {
                    FailurePolicy::Abort => {
                        error!(submission = %submission.id, "Transcription failed: {}", e);
                        return Err(PipelineError::Transcription(e));
                    }
                    FailurePolicy::Degrade => {
                        warn!(submission = %submission.id, "Transcription failed, continuing without transcript: {}", e);
                        TranscriptionResult {
                            raw: String::new(),
                            transcript: String::new(),
                        }
                    }
                }
            }
        };

        submission.advance(PipelineState::Summarizing);
        let summary = match self.summarizer.summarize(&transcription.transcript).await {
            Ok(points) => {
                submission.advance(PipelineState::Summarized);
                SummarizationResult::Summarized(points)
            }
            Err(e) => {
                submission.advance(PipelineState::SummarizeFailed);
                match policy_for(Stage::Summarization) {
                    FailurePolicy::Abort => {
                        error!(submission = %submission.id, "Summarization failed: {}", e);
                        return Err(PipelineError::Summarization(e));
                    }
                    FailurePolicy::Degrade => {
                        warn!(submission = %submission.id, "Summarization failed, using transcript: {}", e);
                        SummarizationResult::Fallback {
                            bullet_points: vec![transcription.transcript.clone()],
                            reason: e.to_string(),
                        }
                    }
                }
            }
        };

        submission.advance(PipelineState::Responded);
        info!(
            submission = %submission.id,
            bullet_points = summary.bullet_points().len(),
            fallback = summary.is_fallback(),
            "Audio processed"
        );
        Ok(PipelineResponse {
            success: true,
            bullet_points: summary.into_bullet_points(),
            transcription: transcription.transcript,
            timestamp: time::to_iso(time::now()),
        })
    }
}
