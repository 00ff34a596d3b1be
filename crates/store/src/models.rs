//! Media records and their database rows.

use crate::error::{Error, ErrorKind};
use crate::file::MediaFile;
use exn::ResultExt;
use std::fmt;
use time::UtcDateTime;

/// One stored media item.
///
/// The `id` is the original file name, not a generated identifier: saving a
/// second file with the same name replaces the first (upsert-by-name).
#[derive(Clone, PartialEq, Eq)]
pub struct MediaRecord {
    pub id: String,
    pub mime_type: String,
    pub name: String,
    pub bytes: Vec<u8>,
    /// Time of the last save, truncated to whole seconds.
    pub saved_at: UtcDateTime,
}
impl MediaRecord {
    /// Build a record for a file about to be saved, keyed by its name.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            mime_type: mime_type.into(),
            name,
            bytes,
            saved_at: now_seconds(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Rehydrate the stored payload back into a file, keeping the original
    /// name and MIME type.
    pub fn into_file(self) -> MediaFile {
        MediaFile::new(self.name, self.mime_type, self.bytes)
    }

    pub fn summary(&self) -> MediaSummary {
        MediaSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            size: self.size(),
            saved_at: self.saved_at,
        }
    }
}
impl fmt::Debug for MediaRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaRecord")
            .field("id", &self.id)
            .field("mime_type", &self.mime_type)
            .field("name", &self.name)
            .field("size", &self.bytes.len())
            .field("saved_at", &self.saved_at)
            .finish()
    }
}

/// Record metadata without the payload, for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSummary {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    /// Payload length in bytes.
    pub size: u64,
    pub saved_at: UtcDateTime,
}

fn now_seconds() -> UtcDateTime {
    let now = UtcDateTime::now();
    now.replace_nanosecond(0).unwrap_or(now)
}

#[derive(sqlx::FromRow)]
pub(crate) struct MediaRow {
    pub(crate) id: String,
    pub(crate) mime_type: String,
    pub(crate) name: String,
    pub(crate) bytes: Vec<u8>,
    pub(crate) saved_at: i64,
}
impl From<&MediaRecord> for MediaRow {
    fn from(record: &MediaRecord) -> Self {
        Self {
            id: record.id.clone(),
            mime_type: record.mime_type.clone(),
            name: record.name.clone(),
            bytes: record.bytes.clone(),
            saved_at: record.saved_at.unix_timestamp(),
        }
    }
}
impl TryFrom<MediaRow> for MediaRecord {
    type Error = Error;
    fn try_from(row: MediaRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            mime_type: row.mime_type,
            name: row.name,
            bytes: row.bytes,
            saved_at: UtcDateTime::from_unix_timestamp(row.saved_at)
                .or_raise(|| ErrorKind::InvalidData("saved_at timestamp"))?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct SummaryRow {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) mime_type: String,
    pub(crate) size: i64,
    pub(crate) saved_at: i64,
}
impl TryFrom<SummaryRow> for MediaSummary {
    type Error = Error;
    fn try_from(row: SummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            mime_type: row.mime_type,
            size: u64::try_from(row.size).or_raise(|| ErrorKind::InvalidData("payload size"))?,
            saved_at: UtcDateTime::from_unix_timestamp(row.saved_at)
                .or_raise(|| ErrorKind::InvalidData("saved_at timestamp"))?,
        })
    }
}
