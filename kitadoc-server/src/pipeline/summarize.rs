//! Bullet-point summarization stage
//!
//! The language model reads its prompt from stdin.

use thiserror::Error;
use tracing::info;

use super::tool::{ToolCommand, ToolError};

const PROMPT_HEADER: &str = "\
Du bist ein spezialisierter Assistent für pädagogische Dokumentation im sozialen Bereich.
Deine Aufgabe ist es, Gesprächsprotokolle effizient und datenschutzkonform zusammenzufassen.
Erstelle aus der folgenden Transkription kurze, sachliche Stichpunkte auf deutsch.
Jede Stichpunktzeile soll mit \"-\" beginnen.
Jeder Stichpunkt muss auf deutsch sein.
Ersetze Vorname und Nachnamen durch den Platzhalter \"[KIND]\".
Ersetze Namen von Eltern oder Angehörigen durch \"[ANGEHÖRIGE]\".
Ignoriere alle privaten Informationen, die keinen direkten Bezug zur pädagogischen oder medizinischen Entwicklung haben (z. B. Hobbys der Eltern, Urlaubsberichte, private Konflikte ohne Fachbezug).
Wandle umgangssprachliche Äußerungen in wertfreie, fachliche Beobachtungen um.

Transkription:
";

const PROMPT_FOOTER: &str = "\n\nStichpunkte:\n-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummarizationResult {
    Summarized(Vec<String>),
    /// Model unavailable or failed; the transcript stands in for the summary
    Fallback { bullet_points: Vec<String>, reason: String },
}

impl SummarizationResult {
    pub fn bullet_points(&self) -> &[String] {
        match self {
            SummarizationResult::Summarized(points) => points,
            SummarizationResult::Fallback { bullet_points, .. } => bullet_points,
        }
    }

    pub fn into_bullet_points(self) -> Vec<String> {
        match self {
            SummarizationResult::Summarized(points) => points,
            SummarizationResult::Fallback { bullet_points, .. } => bullet_points,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, SummarizationResult::Fallback { .. })
    }
}

#[derive(Debug, Error)]
pub enum SummarizationError {
    #[error("Summarizer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error(transparent)]
    Tool(#[from] ToolError),
}

pub struct Summarizer {
    command: ToolCommand,
}

impl Summarizer {
    pub fn new(command: ToolCommand) -> Self {
        Self { command }
    }

    /// Ask the model for bullet points on `transcript`
    ///
    /// The prompt plus a trailing newline is written to stdin.
    pub async fn summarize(&self, transcript: &str) -> Result<Vec<String>, SummarizationError> {
        let mut input = build_prompt(transcript);
        input.push('\n');

        info!(program = %self.command.program(), "Starting summarization");
        let output = self
            .command
            .run(Vec::<String>::new(), Some(input.into_bytes()))
            .await?;

        if !output.success() {
            return Err(SummarizationError::Failed {
                status: output.status.to_string(),
                stderr: output.stderr.trim().to_string(),
            });
        }

        let points = extract_bullet_points(&output.stdout);
        info!(bullet_points = points.len(), "Summarization finished");
        Ok(points)
    }
}

/// Instruction prompt with the transcript embedded
pub fn build_prompt(transcript: &str) -> String {
    format!("{}{}{}", PROMPT_HEADER, transcript, PROMPT_FOOTER)
}

/// Lines starting with "-" after trimming, trimmed, in order
pub fn extract_bullet_points(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('-'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_keeps_dash_lines_only() {
        assert_eq!(
            extract_bullet_points("- Punkt eins\nNotizen\n- Punkt zwei"),
            vec!["- Punkt eins", "- Punkt zwei"]
        );
    }

    #[test]
    fn test_extract_trims_and_allows_empty() {
        assert_eq!(extract_bullet_points("  -eingerückt  \r\n"), vec!["-eingerückt"]);
        assert!(extract_bullet_points("Keine Stichpunkte").is_empty());
        assert!(extract_bullet_points("").is_empty());
    }

    #[test]
    fn test_prompt_embeds_transcript() {
        let prompt = build_prompt("Das Kind spielt gern.");
        assert!(prompt.starts_with("Du bist ein spezialisierter Assistent"));
        assert!(prompt.contains("[KIND]"));
        assert!(prompt.contains("[ANGEHÖRIGE]"));
        assert!(prompt.contains("Transkription:\nDas Kind spielt gern.\n\nStichpunkte:\n-"));
        assert!(prompt.ends_with('-'));
    }
}
