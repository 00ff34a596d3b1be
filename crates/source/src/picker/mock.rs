//! In-memory file source for testing.

use crate::accept::AcceptFilter;
use crate::error::{ErrorKind, Result};
use crate::file::SelectedFile;
use crate::picker::FileSource;
use async_trait::async_trait;
use mediastore_store::MediaFile;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// In-memory file source for testing.
///
/// Hands out pre-seeded files in order, one per request, then behaves like a
/// dismissed picker. Files are still checked against the accept filter.
///
/// # Examples
///
/// ```
/// use mediastore_source::{AcceptFilter, FileSource, MockSource};
/// use mediastore_store::{FileHandle, MediaFile};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = MockSource::with_files([MediaFile::new("a.mp4", "video/mp4", [1, 2, 3])]);
/// let file = source.request_file(&AcceptFilter::any()).await?;
/// assert_eq!(file.name(), "a.mp4");
/// assert!(source.request_file(&AcceptFilter::any()).await.is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockSource {
    queue: Mutex<VecDeque<MediaFile>>,
}
impl MockSource {
    pub fn with_files(files: impl IntoIterator<Item = MediaFile>) -> Self {
        Self { queue: Mutex::new(files.into_iter().collect()) }
    }

    pub async fn remaining(&self) -> usize {
        self.queue.lock().await.len()
    }
}

#[async_trait]
impl FileSource for MockSource {
    async fn request_file(&self, accept: &AcceptFilter) -> Result<SelectedFile> {
        let Some(file) = self.queue.lock().await.pop_front() else {
            exn::bail!(ErrorKind::NoFileSelected);
        };
        if !accept.matches(&file.name, &file.mime_type) {
            exn::bail!(ErrorKind::Rejected {
                name: file.name,
                mime_type: file.mime_type,
                accept: accept.to_string(),
            });
        }
        Ok(SelectedFile::in_memory(file))
    }
}
