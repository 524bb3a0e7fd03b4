//! Archive sinks: where exported bytes land.
//!
//! Every writer in the crate publishes through [`ArchiveSink`]. Backends:
//! - [`DirectoryArchive`] - plain files under a root directory
//! - [`BufferedArchive`] - one in-memory zip
//! - [`PartitionedArchive`] - one in-memory zip per inserted path
//! - [`SubArchive`] - forwards into a parent sink under a path prefix

mod buffered;
mod directory;
mod partitioned;
mod sub;
pub mod zip;

pub use buffered::BufferedArchive;
pub use directory::DirectoryArchive;
pub use partitioned::PartitionedArchive;
pub use sub::SubArchive;

use crate::util::Result;

/// Default initial buffer size for in-memory backends.
pub const DEFAULT_BUFFER_SIZE: usize = 10_000;

/// Destination of an export.
///
/// `open` before the first insert, `close` exactly once at the end.
pub trait ArchiveSink {
    /// Prepare the destination.
    fn open(&mut self) -> Result<()>;

    /// Finalize the destination. A second call fails.
    fn close(&mut self) -> Result<()>;

    /// Store `data` under `relative_path`.
    fn insert(&mut self, relative_path: &str, data: &[u8]) -> Result<()>;

    /// True if `relative_path` was already stored.
    fn contains(&self, relative_path: &str) -> bool;
}

/// Lifecycle of a sink with an explicit open/close protocol.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum SinkState {
    #[default]
    Created,
    Open,
    Closed,
}

/// Join a prefix and a relative path with a single `/`.
pub(crate) fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if prefix.is_empty() {
        path.to_string()
    } else if path.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}/{path}")
    }
}
