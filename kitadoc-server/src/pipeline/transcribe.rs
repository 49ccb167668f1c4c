//! Speech-to-text stage

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{error, info};

use super::tool::{ToolCommand, ToolError};

/// Warning banner some BLAS builds print on stdout before the transcript
static MKL_BANNER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Intel MKL WARNING[\s\S]*?instructions\.").expect("static pattern"));

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("Transcriber exited with {status}")]
    Failed { status: String, stderr: String },

    #[error(transparent)]
    Tool(#[from] ToolError),
}

impl TranscriptionError {
    /// Diagnostics for the client: captured stderr, or the launch failure
    pub fn details(&self) -> String {
        match self {
            TranscriptionError::Failed { stderr, .. } => stderr.clone(),
            TranscriptionError::Tool(e) => e.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionResult {
    /// Everything the tool printed on stdout
    pub raw: String,
    /// `raw` without banner noise, trimmed
    pub transcript: String,
}

impl TranscriptionResult {
    /// Characters dropped from `raw` by cleaning
    pub fn stripped_chars(&self) -> usize {
        self.raw
            .chars()
            .count()
            .saturating_sub(self.transcript.chars().count())
    }
}

pub struct Transcriber {
    command: ToolCommand,
}

impl Transcriber {
    pub fn new(command: ToolCommand) -> Self {
        Self { command }
    }

    /// Transcribe the audio at `path`, passed as the final argument
    pub async fn transcribe(&self, path: &Path) -> Result<TranscriptionResult, TranscriptionError> {
        info!(program = %self.command.program(), "Starting transcription");
        let output = self.command.run([path], None).await?;

        if !output.success() {
            error!(status = %output.status, stderr = %output.stderr.trim(), "Transcription failed");
            return Err(TranscriptionError::Failed {
                status: output.status.to_string(),
                stderr: output.stderr,
            });
        }

        let transcript = clean_transcript(&output.stdout);
        info!(chars = transcript.chars().count(), "Transcription finished");
        Ok(TranscriptionResult {
            raw: output.stdout,
            transcript,
        })
    }
}

/// Strip every MKL warning block, then surrounding whitespace
pub fn clean_transcript(raw: &str) -> String {
    MKL_BANNER.replace_all(raw, "").trim().to_string()
}
