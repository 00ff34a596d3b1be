//! Files produced by a [`FileSource`](crate::FileSource).

use async_trait::async_trait;
use mediastore_store::{FileHandle, MediaFile};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
enum Content {
    /// Read lazily, when the file is saved.
    Disk(PathBuf),
    Memory(MediaFile),
}

/// A selected file: name and MIME type up-front, content on demand.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    name: String,
    mime_type: String,
    content: Content,
}
impl SelectedFile {
    pub(crate) fn on_disk(path: PathBuf, name: String, mime_type: String) -> Self {
        Self { name, mime_type, content: Content::Disk(path) }
    }

    pub fn in_memory(file: MediaFile) -> Self {
        Self {
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            content: Content::Memory(file),
        }
    }

    /// Where the file lives, if it was picked from disk.
    pub fn path(&self) -> Option<&Path> {
        match &self.content {
            Content::Disk(path) => Some(path),
            Content::Memory(_) => None,
        }
    }
}

#[async_trait]
impl FileHandle for SelectedFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        match &self.content {
            Content::Disk(path) => tokio::fs::read(path).await,
            Content::Memory(file) => file.read_bytes().await,
        }
    }
}
