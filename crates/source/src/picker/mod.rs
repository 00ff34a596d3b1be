//! File source trait and implementations.
//!
//! A file source stands in for an interactive picker: each call to
//! [`request_file`](FileSource::request_file) either produces exactly one
//! file or fails, once.

mod local;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::local::PathSource;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockSource;
use crate::accept::AcceptFilter;
use crate::error::Result;
use crate::file::SelectedFile;
use async_trait::async_trait;

/// Produces one file per request.
///
/// # Examples
///
/// ```no_run
/// use mediastore_source::{AcceptFilter, FileSource, error::Result};
/// use mediastore_store::FileHandle;
///
/// async fn pick_video(source: &dyn FileSource) -> Result<()> {
///     let file = source.request_file(&AcceptFilter::parse("video/*")).await?;
///     println!("Selected {} ({})", file.name(), file.mime_type());
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Produce one file matching `accept`.
    ///
    /// Fails with [`NoFileSelected`](crate::error::ErrorKind::NoFileSelected)
    /// if the selection was dismissed, and with
    /// [`Rejected`](crate::error::ErrorKind::Rejected) if the chosen file
    /// doesn't match the filter.
    async fn request_file(&self, accept: &AcceptFilter) -> Result<SelectedFile>;
}
