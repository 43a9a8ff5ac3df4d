//! Itinerary documents
//!
//! Rendering is split in three: [`markup`] classifies the narrative line by line,
//! [`layout`] positions the result on pages, [`pdf`] encodes those pages. Only the
//! final write touches the filesystem.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::narrative::NarrativeText;

pub mod layout;
pub mod markup;
pub mod pdf;

pub use layout::{Item, Page, Run};
pub use markup::{Block, Span, Weight};

const FILE_PREFIX: &str = "travel-itinerary";

#[derive(Debug, Clone)]
pub struct DocumentRenderer {
    directory: PathBuf,
    title: String,
}

impl DocumentRenderer {
    pub fn new(directory: impl AsRef<Path>, title: impl Into<String>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            title: title.into(),
        }
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Pages for `narrative`, without touching the filesystem
    #[must_use]
    pub fn layout(&self, narrative: &NarrativeText) -> Vec<Page> {
        let blocks = markup::parse(narrative.as_str());
        layout::layout(&blocks, Some(self.title.as_str()))
    }

    /// Write `narrative` as a new PDF in the output directory and return its path
    #[instrument(skip_all, fields(directory = %self.directory.display()))]
    pub async fn render(&self, narrative: &NarrativeText) -> Result<PathBuf> {
        let pages = self.layout(narrative);
        let bytes = pdf::encode(&pages, &self.title)?;
        debug!("Encoded {} pages into {} bytes", pages.len(), bytes.len());

        fs::create_dir_all(&self.directory).await?;
        let path = self.write_new_file(&bytes).await?;
        info!("Wrote itinerary document {}", path.display());
        Ok(path)
    }

    /// Create a file that did not exist before; a numeric suffix is added on collision
    async fn write_new_file(&self, bytes: &[u8]) -> Result<PathBuf> {
        let stamp = Utc::now().format("%Y%m%d-%H%M%S%.3f").to_string();
        let mut attempt = 0u32;
        loop {
            let name = if attempt == 0 {
                format!("{FILE_PREFIX}-{stamp}.pdf")
            } else {
                format!("{FILE_PREFIX}-{stamp}-{attempt}.pdf")
            };
            let path = self.directory.join(name);

            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => {
                    write_or_discard(file, &path, bytes).await?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Write `bytes` and flush. On failure the file at `path` is removed so no
/// truncated document is left behind.
async fn write_or_discard<W: AsyncWrite + Unpin>(mut writer: W, path: &Path, bytes: &[u8]) -> Result<()> {
    let written = async {
        writer.write_all(bytes).await?;
        writer.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(writer);
        if let Err(remove) = fs::remove_file(path).await {
            warn!("Failed to remove incomplete document {}: {}", path.display(), remove);
        }
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Accepts no bytes, like a full disk
    struct FullDisk;

    impl AsyncWrite for FullDisk {
        fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, _buf: &[u8]) -> Poll<std::io::Result<usize>> {
            Poll::Ready(Err(std::io::Error::other("No space left on device")))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("travel-itinerary-test.pdf");
        std::fs::write(&path, b"").unwrap();

        let err = write_or_discard(FullDisk, &path, b"%PDF-1.5").await.unwrap_err();

        assert!(matches!(err, crate::TripPlannerError::Io { .. }));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_render_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("tmp");
        let renderer = DocumentRenderer::new(&out, "Trip");

        let path = renderer.render(&NarrativeText::new("**DAY 1**\nHello")).await.unwrap();

        assert!(path.starts_with(&out));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("travel-itinerary-") && name.ends_with(".pdf"), "{name}");
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_unwritable_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let renderer = DocumentRenderer::new(blocker.join("out"), "Trip");

        let err = renderer.render(&NarrativeText::new("text")).await.unwrap_err();
        assert!(matches!(err, crate::TripPlannerError::Io { .. }));
    }
}
