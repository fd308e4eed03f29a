//! Filesystem queries made by route handlers.

use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Read-only filesystem probe.
pub trait FileStat: Send + Sync + std::fmt::Debug {
    /// Whether the file exists and can be opened for reading.
    fn is_readable(&self, path: &Path) -> bool;

    /// Modification time in seconds since the epoch.
    fn modified(&self, path: &Path) -> io::Result<u64>;
}

/// [`FileStat`] against the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileStat;

impl FileStat for LocalFileStat {
    fn is_readable(&self, path: &Path) -> bool {
        std::fs::File::open(path).is_ok()
    }

    fn modified(&self, path: &Path) -> io::Result<u64> {
        let modified = std::fs::metadata(path)?.modified()?;
        let since_epoch = modified
            .duration_since(UNIX_EPOCH)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(since_epoch.as_secs())
    }
}
