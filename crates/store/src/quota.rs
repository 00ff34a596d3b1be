//! Storage quota estimation.
//!
//! Estimates cover the whole storage area (every file in the data directory),
//! not just one collection, and are approximate. Treat them as advisory; they
//! are never cached, every snapshot asks the estimator again.

use crate::config::{DatabaseConfig, Location};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Raw numbers reported by an estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimate {
    pub quota_bytes: u64,
    pub used_bytes: u64,
}

/// Point-in-time storage usage, derived from an [`Estimate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageSnapshot {
    pub quota_bytes: u64,
    pub used_bytes: u64,
    /// `quota - used`, never below zero.
    pub available_bytes: u64,
    /// `used / quota`. With a zero quota this is `0.0` when nothing is used
    /// and `1.0` otherwise, so it is always finite.
    pub used_fraction: f64,
    /// `ceil(fraction * 100)`, clamped to `0..=100`.
    pub used_percentage: u8,
}
impl From<Estimate> for UsageSnapshot {
    fn from(estimate: Estimate) -> Self {
        let Estimate { quota_bytes, used_bytes } = estimate;
        let used_fraction = match (quota_bytes, used_bytes) {
            (0, 0) => 0.0,
            (0, _) => 1.0,
            (quota, used) => used as f64 / quota as f64,
        };
        let used_percentage = (used_fraction * 100.0).ceil().clamp(0.0, 100.0) as u8;
        Self {
            quota_bytes,
            used_bytes,
            available_bytes: quota_bytes.saturating_sub(used_bytes),
            used_fraction,
            used_percentage,
        }
    }
}

/// Source of storage estimates.
#[async_trait]
pub trait QuotaEstimator: Send + Sync {
    /// Report total quota and used bytes, or fail with
    /// [`Unsupported`](ErrorKind::Unsupported) if this estimator can't.
    async fn estimate(&self) -> Result<Estimate>;
}

/// Query `estimator` and derive a fresh usage snapshot.
pub async fn get_usage_snapshot(estimator: &(impl QuotaEstimator + ?Sized)) -> Result<UsageSnapshot> {
    let snapshot = UsageSnapshot::from(estimator.estimate().await?);
    tracing::debug!(
        quota = snapshot.quota_bytes,
        used = snapshot.used_bytes,
        percentage = snapshot.used_percentage,
        "Storage usage estimated"
    );
    Ok(snapshot)
}

/// Pick the estimator matching a database's location.
///
/// File-backed databases are measured by walking their directory, against the
/// configured quota or else the filesystem's capacity; in-memory databases
/// have no storage area to measure.
pub fn estimator_for(config: &DatabaseConfig, quota_bytes: Option<u64>) -> Box<dyn QuotaEstimator> {
    match &config.location {
        Location::Directory(dir) => Box::new(DirectoryEstimator::new(dir, quota_bytes)),
        Location::InMemory => Box::new(UnsupportedEstimator::new("in-memory databases have no storage area")),
    }
}

/// Measures usage as the total size of all regular files beneath a directory.
///
/// Without a configured quota, the quota is what the storage area could grow
/// to: its current usage plus the space still available to unprivileged users
/// on the filesystem holding it.
#[derive(Debug, Clone)]
pub struct DirectoryEstimator {
    root: PathBuf,
    quota_bytes: Option<u64>,
}
impl DirectoryEstimator {
    pub fn new(root: impl Into<PathBuf>, quota_bytes: Option<u64>) -> Self {
        Self { root: root.into(), quota_bytes }
    }

    async fn used_bytes(&self) -> Result<u64> {
        let mut total = 0u64;
        let mut stack = vec![self.root.clone()];
        while let Some(current) = stack.pop() {
            let mut entries = match fs::read_dir(&current).await {
                Ok(entries) => entries,
                // A storage area that doesn't exist yet holds nothing.
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err).or_raise(|| ErrorKind::Read),
            };
            while let Some(entry) = entries.next_entry().await.or_raise(|| ErrorKind::Read)? {
                let metadata = match entry.metadata().await {
                    Ok(metadata) => metadata,
                    // Files can disappear mid-walk (SQLite removes its WAL on close).
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                    Err(err) => return Err(err).or_raise(|| ErrorKind::Read),
                };
                if metadata.is_dir() {
                    stack.push(entry.path());
                } else if metadata.is_file() {
                    total = total.saturating_add(metadata.len());
                } else {
                    tracing::trace!(path = %entry.path().display(), "Skipping non-regular file in usage estimate");
                }
            }
        }
        Ok(total)
    }

    async fn free_bytes(&self) -> Result<u64> {
        let root = self.root.clone();
        let free = tokio::task::spawn_blocking(move || {
            // The storage area may not exist yet; measure the filesystem it will land on.
            let existing = root.ancestors().find(|path| path.exists()).unwrap_or(root.as_path());
            available_space(existing)
        })
        .await
        .or_raise(|| ErrorKind::Read)?;
        free.or_raise(|| ErrorKind::Unsupported(format!("filesystem capacity unknown for {}", self.root.display())))
    }
}

#[async_trait]
impl QuotaEstimator for DirectoryEstimator {
    async fn estimate(&self) -> Result<Estimate> {
        let used_bytes = self.used_bytes().await?;
        let quota_bytes = match self.quota_bytes {
            Some(quota_bytes) => quota_bytes,
            None => used_bytes.saturating_add(self.free_bytes().await?),
        };
        Ok(Estimate { quota_bytes, used_bytes })
    }
}

/// Bytes available to unprivileged users on the filesystem containing `path`.
#[cfg(unix)]
fn available_space(path: &Path) -> io::Result<u64> {
    use std::ffi::CString;
    use std::mem::MaybeUninit;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())?;
    let mut stat = MaybeUninit::<libc::statvfs>::uninit();
    // SAFETY: `c_path` is NUL-terminated and outlives the call; `stat` is
    // only read after statvfs reports success.
    let stat = unsafe {
        if libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) != 0 {
            return Err(io::Error::last_os_error());
        }
        stat.assume_init()
    };
    // Field widths differ between platforms.
    #[allow(clippy::unnecessary_cast)]
    let (blocks, block_size) = (stat.f_bavail as u64, stat.f_frsize as u64);
    Ok(blocks.saturating_mul(block_size))
}

#[cfg(not(unix))]
fn available_space(_path: &Path) -> io::Result<u64> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "filesystem capacity is only queried on unix"))
}

/// Always reports the same numbers.
#[derive(Debug, Clone, Copy)]
pub struct FixedEstimator(pub Estimate);

#[async_trait]
impl QuotaEstimator for FixedEstimator {
    async fn estimate(&self) -> Result<Estimate> {
        Ok(self.0)
    }
}

/// For hosts without any way to estimate storage.
#[derive(Debug, Clone)]
pub struct UnsupportedEstimator {
    reason: String,
}
impl UnsupportedEstimator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait]
impl QuotaEstimator for UnsupportedEstimator {
    async fn estimate(&self) -> Result<Estimate> {
        exn::bail!(ErrorKind::Unsupported(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn snapshot(quota_bytes: u64, used_bytes: u64) -> UsageSnapshot {
        UsageSnapshot::from(Estimate { quota_bytes, used_bytes })
    }

    #[rstest]
    #[case(1000, 0, 1000, 0)]
    #[case(1000, 1, 999, 1)]
    #[case(1000, 250, 750, 25)]
    #[case(1000, 251, 749, 26)]
    #[case(1000, 1000, 0, 100)]
    // Hosts may report more usage than quota; clamp rather than go negative.
    #[case(1000, 1500, 0, 100)]
    #[case(0, 0, 0, 0)]
    #[case(0, 10, 0, 100)]
    fn test_snapshot_derivation(
        #[case] quota: u64,
        #[case] used: u64,
        #[case] available: u64,
        #[case] percentage: u8,
    ) {
        let snapshot = snapshot(quota, used);
        assert_eq!(snapshot.available_bytes, available);
        assert_eq!(snapshot.used_percentage, percentage);
        assert!(snapshot.available_bytes <= snapshot.quota_bytes);
        assert!(snapshot.used_fraction.is_finite());
    }

    #[test]
    fn test_fraction() {
        assert_eq!(snapshot(200, 50).used_fraction, 0.25);
        assert_eq!(snapshot(0, 0).used_fraction, 0.0);
        assert_eq!(snapshot(0, 1).used_fraction, 1.0);
    }

    #[tokio::test]
    async fn test_fixed_estimator() {
        let estimator = FixedEstimator(Estimate { quota_bytes: 100, used_bytes: 40 });
        let snapshot = get_usage_snapshot(&estimator).await.unwrap();
        assert_eq!(snapshot.available_bytes, 60);
        assert_eq!(snapshot.used_percentage, 40);
    }

    #[tokio::test]
    async fn test_unsupported_estimator() {
        let err = get_usage_snapshot(&UnsupportedEstimator::new("nope")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_directory_estimator_sums_nested_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("a.bin"), [0u8; 100]).unwrap();
        std::fs::create_dir_all(temp_dir.path().join("nested/deeper")).unwrap();
        std::fs::write(temp_dir.path().join("nested/deeper/b.bin"), [0u8; 23]).unwrap();
        let estimator = DirectoryEstimator::new(temp_dir.path(), Some(1000));
        let estimate = estimator.estimate().await.unwrap();
        assert_eq!(estimate, Estimate { quota_bytes: 1000, used_bytes: 123 });
    }

    #[tokio::test]
    async fn test_directory_estimator_missing_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let estimator = DirectoryEstimator::new(temp_dir.path().join("not-yet"), Some(10));
        assert_eq!(estimator.estimate().await.unwrap().used_bytes, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_directory_estimator_defaults_to_filesystem_capacity() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("a.bin"), [0u8; 64]).unwrap();
        let estimate = DirectoryEstimator::new(temp_dir.path(), None).estimate().await.unwrap();
        assert_eq!(estimate.used_bytes, 64);
        assert!(estimate.quota_bytes >= estimate.used_bytes);

        // Not created yet: measured against the nearest existing parent.
        let estimate = DirectoryEstimator::new(temp_dir.path().join("later/data"), None).estimate().await.unwrap();
        assert_eq!(estimate.used_bytes, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_usage_snapshot_without_configured_quota() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig::in_directory(temp_dir.path());
        let snapshot = get_usage_snapshot(&*estimator_for(&config, None)).await.unwrap();
        assert!(snapshot.available_bytes <= snapshot.quota_bytes);
        assert!(snapshot.used_percentage <= 100);
    }

    #[tokio::test]
    async fn test_estimator_for_location() {
        let err = estimator_for(&DatabaseConfig::in_memory(), Some(10)).estimate().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Unsupported(_)));

        let temp_dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig::in_directory(temp_dir.path());
        assert_eq!(estimator_for(&config, Some(10)).estimate().await.unwrap().quota_bytes, 10);
    }
}
