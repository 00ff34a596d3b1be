//! Local filesystem file source.

use crate::accept::AcceptFilter;
use crate::error::{ErrorKind, Result};
use crate::file::SelectedFile;
use crate::mime::{self, SNIFF_BYTES};
use crate::picker::FileSource;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncReadExt;
use tokio::sync::Mutex;

/// Picks a file from the local filesystem.
///
/// Holds at most one pending selection (the path the user chose) and hands it
/// out on the first request. A source with nothing pending, or one that has
/// already been used, behaves like a dismissed picker.
///
/// # Examples
///
/// ```no_run
/// use mediastore_source::{AcceptFilter, FileSource, PathSource};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let source = PathSource::new("/home/me/Videos/holiday.mp4");
/// let file = source.request_file(&AcceptFilter::parse("video/*")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct PathSource {
    pending: Mutex<Option<PathBuf>>,
}
impl PathSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { pending: Mutex::new(Some(path.into())) }
    }

    /// A source with no selection; every request fails with
    /// [`NoFileSelected`](ErrorKind::NoFileSelected).
    pub fn dismissed() -> Self {
        Self::default()
    }

    pub fn from_option(path: Option<PathBuf>) -> Self {
        Self { pending: Mutex::new(path) }
    }

    async fn read_head(path: &Path, bytes: usize) -> Result<Vec<u8>> {
        let file = fs::File::open(path).await.map_err(|e| ErrorKind::from_io(e, path))?;
        let mut buffer = Vec::with_capacity(bytes);
        file.take(bytes as u64).read_to_end(&mut buffer).await.map_err(ErrorKind::Io)?;
        Ok(buffer)
    }
}

#[async_trait]
impl FileSource for PathSource {
    async fn request_file(&self, accept: &AcceptFilter) -> Result<SelectedFile> {
        // Taken before anything can fail: a selection is used up by the
        // request it answers, successful or not.
        let Some(path) = self.pending.lock().await.take() else {
            exn::bail!(ErrorKind::NoFileSelected);
        };
        let metadata = fs::metadata(&path).await.map_err(|e| ErrorKind::from_io(e, &path))?;
        if !metadata.is_file() {
            exn::bail!(ErrorKind::NotAFile(path));
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            exn::bail!(ErrorKind::InvalidName(path));
        };
        let head = Self::read_head(&path, SNIFF_BYTES).await?;
        let mime_type = mime::detect(&name, &head);
        if !accept.matches(&name, &mime_type) {
            exn::bail!(ErrorKind::Rejected { name, mime_type, accept: accept.to_string() });
        }
        tracing::debug!(path = %path.display(), %mime_type, bytes = metadata.len(), "File selected");
        Ok(SelectedFile::on_disk(path, name, mime_type))
    }
}
