//! Uploaded audio written to a temporary file
//!
//! The file belongs to a single request. [`TempAudioFile::remove`] deletes it
//! explicitly after transcription; dropping the guard deletes it otherwise.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug)]
pub struct TempAudioFile {
    path: PathBuf,
    removed: bool,
}

impl TempAudioFile {
    /// Write `bytes` to a fresh file in `dir`
    ///
    /// The extension of `original_name` is kept so that format detection in
    /// the transcriber still works.
    pub async fn write(dir: &Path, original_name: Option<&str>, bytes: &[u8]) -> io::Result<Self> {
        let mut name = format!("kitadoc_upload_{}", Uuid::new_v4());
        if let Some(ext) = original_name.and_then(safe_extension) {
            name.push('.');
            name.push_str(&ext);
        }
        let path = dir.join(name);

        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "Audio upload stored");
        Ok(Self { path, removed: false })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file; a file that is already gone counts as removed
    pub async fn remove(mut self) -> io::Result<()> {
        self.removed = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Audio upload removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for TempAudioFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), "Failed to remove audio upload: {}", e);
            }
        }
    }
}

/// Lowercased extension if it is short and alphanumeric
fn safe_extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_remove() {
        let dir = TempDir::new().unwrap();
        let file = TempAudioFile::write(dir.path(), Some("aufnahme.WEBM"), b"RIFF").await.unwrap();

        let path = file.path().to_path_buf();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("webm"));
        assert_eq!(std::fs::read(&path).unwrap(), b"RIFF");

        file.remove().await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_drop_removes_file() {
        let dir = TempDir::new().unwrap();
        let file = TempAudioFile::write(dir.path(), None, b"data").await.unwrap();
        let path = file.path().to_path_buf();

        drop(file);
        assert!(!path.exists());
    }

    #[test]
    fn test_safe_extension() {
        assert_eq!(safe_extension("a.mp3").as_deref(), Some("mp3"));
        assert_eq!(safe_extension("blob"), None);
        assert_eq!(safe_extension("x.../../etc"), None);
        assert_eq!(safe_extension("x.verylongextension"), None);
    }
}
