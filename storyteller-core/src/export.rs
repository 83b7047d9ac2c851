//! Plain-text story export.
//!
//! The one on-demand artifact the system produces: a story's text written to
//! a file named deterministically from the entry's creation sequence. No
//! other persisted format exists.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::history::StoryEntry;

/// Errors from story export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Deterministic export filename for a story's sequence number.
pub fn story_filename(sequence: u64) -> String {
    format!("story_{sequence}.txt")
}

/// Write the entry's story text to `dir`, returning the path written.
pub async fn write_story(dir: impl AsRef<Path>, entry: &StoryEntry) -> Result<PathBuf, ExportError> {
    let path = dir.as_ref().join(story_filename(entry.sequence));
    fs::write(&path, entry.story.as_bytes()).await?;
    debug!(path = %path.display(), "story exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::StoryLength;

    #[test]
    fn test_filename_is_deterministic() {
        assert_eq!(story_filename(1), "story_1.txt");
        assert_eq!(story_filename(42), "story_42.txt");
    }

    #[tokio::test]
    async fn test_write_story() {
        let dir = tempfile::tempdir().unwrap();
        let entry = StoryEntry {
            sequence: 3,
            prompt: "A shy dragon".into(),
            story: "Once upon a time...".into(),
            genre: Some("Fantasy".into()),
            length: StoryLength::Short,
        };

        let path = write_story(dir.path(), &entry).await.unwrap();

        assert_eq!(path, dir.path().join("story_3.txt"));
        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(written, "Once upon a time...");
    }
}
