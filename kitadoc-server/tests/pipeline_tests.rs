//! Pipeline tests with `sh -c` scripts standing in for the speech-to-text
//! and language model tools
//!
//! With `sh -c <script> <path>` the audio path arrives as `$0`.

use kitadoc_server::pipeline::{
    AudioPipeline, PipelineError, Summarizer, TempAudioFile, ToolCommand, Transcriber,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn sh(script: &str) -> ToolCommand {
    ToolCommand::new("sh", vec!["-c".to_string(), script.to_string()])
}

fn pipeline(transcribe: &str, summarize: &str) -> AudioPipeline {
    AudioPipeline::new(Transcriber::new(sh(transcribe)), Summarizer::new(sh(summarize)))
}

async fn upload(dir: &Path) -> (TempAudioFile, PathBuf) {
    let file = TempAudioFile::write(dir, Some("aufnahme.wav"), b"RIFF....WAVE").await.unwrap();
    let path = file.path().to_path_buf();
    (file, path)
}

#[tokio::test]
async fn test_plain_transcript_is_kept() {
    let dir = TempDir::new().unwrap();
    let (file, path) = upload(dir.path()).await;
    let pipeline = pipeline("echo 'Hallo Welt'", "cat > /dev/null; echo '- Begrüßung'");

    let response = pipeline.process(file).await.unwrap();

    assert!(response.success);
    assert_eq!(response.transcription, "Hallo Welt");
    assert_eq!(response.bullet_points, vec!["- Begrüßung"]);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_mkl_banner_is_stripped() {
    let dir = TempDir::new().unwrap();
    let (file, _) = upload(dir.path()).await;
    let pipeline = pipeline(
        "echo 'Intel MKL WARNING: Support of Intel(R) Streaming SIMD Extensions 4.2 (Intel(R) SSE4.2)'; \
         echo 'enabled only processors has been deprecated. Please use Intel(R) AVX instructions.'; \
         echo 'Test Satz.'",
        "cat > /dev/null; echo '- Satz'",
    );

    let response = pipeline.process(file).await.unwrap();
    assert_eq!(response.transcription, "Test Satz.");
}

#[tokio::test]
async fn test_summarizer_failure_falls_back_to_transcript() {
    let dir = TempDir::new().unwrap();
    let (file, _) = upload(dir.path()).await;
    let pipeline = pipeline("echo 'Das Kind hat gebaut.'", "cat > /dev/null; echo 'model missing' >&2; exit 1");

    let response = pipeline.process(file).await.unwrap();

    assert!(response.success);
    assert_eq!(response.bullet_points, vec!["Das Kind hat gebaut."]);
    assert_eq!(response.transcription, "Das Kind hat gebaut.");
}

#[tokio::test]
async fn test_missing_summarizer_falls_back_to_transcript() {
    let dir = TempDir::new().unwrap();
    let (file, _) = upload(dir.path()).await;
    let pipeline = AudioPipeline::new(
        Transcriber::new(sh("echo 'Hallo Welt'")),
        Summarizer::new(ToolCommand::new("kitadoc-no-such-model", vec![])),
    );

    let response = pipeline.process(file).await.unwrap();
    assert_eq!(response.bullet_points, vec!["Hallo Welt"]);
}

#[tokio::test]
async fn test_only_dash_lines_become_bullet_points() {
    let dir = TempDir::new().unwrap();
    let (file, _) = upload(dir.path()).await;
    let pipeline = pipeline(
        "echo 'Hallo Welt'",
        "cat > /dev/null; printf '%s\\n' '- Punkt eins' 'Notizen' '- Punkt zwei'",
    );

    let response = pipeline.process(file).await.unwrap();
    assert_eq!(response.bullet_points, vec!["- Punkt eins", "- Punkt zwei"]);
}

#[tokio::test]
async fn test_summarizer_receives_prompt_on_stdin() {
    let dir = TempDir::new().unwrap();
    let (file, _) = upload(dir.path()).await;
    let pipeline = pipeline(
        "echo 'Hallo Welt'",
        "input=$(cat); case \"$input\" in *'Transkription:'*'Hallo Welt'*'Stichpunkte:'*) echo '- Prompt ok';; *) exit 1;; esac",
    );

    let response = pipeline.process(file).await.unwrap();
    assert_eq!(response.bullet_points, vec!["- Prompt ok"]);
}

#[tokio::test]
async fn test_empty_bullet_list_is_valid() {
    let dir = TempDir::new().unwrap();
    let (file, _) = upload(dir.path()).await;
    let pipeline = pipeline("echo 'Hallo Welt'", "cat > /dev/null; echo 'Keine Stichpunkte.'");

    let response = pipeline.process(file).await.unwrap();
    assert!(response.success);
    assert!(response.bullet_points.is_empty());
}

#[tokio::test]
async fn test_transcriber_sees_file_and_file_is_removed() {
    let dir = TempDir::new().unwrap();
    let (file, path) = upload(dir.path()).await;
    let pipeline = pipeline(
        "test -f \"$0\" && echo \"$0\"",
        "cat > /dev/null; echo '- ok'",
    );

    let response = pipeline.process(file).await.unwrap();

    assert_eq!(response.transcription, path.display().to_string());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_transcription_failure_reports_stderr_and_removes_file() {
    let dir = TempDir::new().unwrap();
    let (file, path) = upload(dir.path()).await;
    let pipeline = pipeline(
        "echo 'CUDA out of memory' >&2; exit 1",
        "cat > /dev/null; echo '- nie erreicht'",
    );

    let err = pipeline.process(file).await.unwrap_err();

    assert!(matches!(err, PipelineError::Transcription(_)));
    assert!(err.details().contains("CUDA out of memory"));
    assert!(!path.exists());
}

#[tokio::test]
async fn test_missing_transcriber_removes_file() {
    let dir = TempDir::new().unwrap();
    let (file, path) = upload(dir.path()).await;
    let pipeline = AudioPipeline::new(
        Transcriber::new(ToolCommand::new("kitadoc-no-such-transcriber", vec![])),
        Summarizer::new(sh("cat > /dev/null")),
    );

    let err = pipeline.process(file).await.unwrap_err();

    assert!(err.details().contains("kitadoc-no-such-transcriber"));
    assert!(!path.exists());
}

#[tokio::test]
async fn test_transcriber_timeout_is_a_failure() {
    let dir = TempDir::new().unwrap();
    let (file, path) = upload(dir.path()).await;
    let pipeline = AudioPipeline::new(
        Transcriber::new(sh("sleep 5").with_timeout(Some(Duration::from_millis(200)))),
        Summarizer::new(sh("cat > /dev/null")),
    );

    let err = pipeline.process(file).await.unwrap_err();

    assert!(err.details().contains("did not finish"));
    assert!(!path.exists());
}
