//! Local file selection.
//!
//! Stands in for an interactive file picker: a [`FileSource`] produces one
//! [`SelectedFile`] per request, checked against an [`AcceptFilter`] and
//! labelled with a MIME type. Selected files implement
//! [`FileHandle`](mediastore_store::FileHandle), so they can be handed
//! straight to the media store.

mod accept;
pub mod error;
mod file;
pub mod mime;
mod picker;

pub use crate::accept::AcceptFilter;
pub use crate::file::SelectedFile;
#[cfg(any(test, feature = "mock"))]
pub use crate::picker::MockSource;
pub use crate::picker::{FileSource, PathSource};
