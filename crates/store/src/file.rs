//! File handles accepted by the store.

use async_trait::async_trait;
use std::fmt;

/// Anything that can be saved as a media record.
///
/// Name and MIME type are known up-front; the binary content is materialised
/// on demand (and may suspend, or fail) when the store saves the file.
#[async_trait]
pub trait FileHandle: Send + Sync {
    /// Original file name. Becomes the record id.
    fn name(&self) -> &str;

    /// Content type, e.g. `video/mp4`.
    fn mime_type(&self) -> &str;

    /// Read the complete binary content into memory.
    async fn read_bytes(&self) -> std::io::Result<Vec<u8>>;
}

/// An in-memory file: name, MIME type and content.
///
/// This is what a stored [`MediaRecord`](crate::MediaRecord) rehydrates into,
/// and it can be handed straight back to
/// [`save_media`](crate::Repository::save_media).
#[derive(Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}
impl MediaFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}
// Payloads can be hundreds of megabytes; don't dump them into logs.
impl fmt::Debug for MediaFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

#[async_trait]
impl FileHandle for MediaFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}
