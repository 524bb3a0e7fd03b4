//! Directory-backed archive sink.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{ArchiveSink, SinkState};
use crate::util::{Error, Result};

/// Writes every entry as a plain file below a root directory.
pub struct DirectoryArchive {
    root: PathBuf,
    state: SinkState,
}

impl DirectoryArchive {
    /// Create a sink rooted at `root`. Nothing touches the disk until `open`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            state: SinkState::Created,
        }
    }

    /// Root directory of the archive.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, relative_path: &str) -> PathBuf {
        self.root.join(relative_path.trim_start_matches('/'))
    }
}

impl ArchiveSink for DirectoryArchive {
    fn open(&mut self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(Error::MissingDestination);
        }
        fs::create_dir_all(&self.root).map_err(|_| Error::CreateDir(self.root.clone()))?;
        self.state = SinkState::Open;
        debug!("opened directory archive {}", self.root.display());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        match self.state {
            SinkState::Closed => Err(Error::ArchiveClosed(self.root.display().to_string())),
            _ => {
                self.state = SinkState::Closed;
                Ok(())
            }
        }
    }

    fn insert(&mut self, relative_path: &str, data: &[u8]) -> Result<()> {
        match self.state {
            SinkState::Created => {
                return Err(Error::ArchiveNotOpen(self.root.display().to_string()))
            }
            SinkState::Closed => {
                return Err(Error::ArchiveClosed(self.root.display().to_string()))
            }
            SinkState::Open => {}
        }

        let path = self.full_path(relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_| Error::CreateDir(parent.to_path_buf()))?;
        }
        fs::write(&path, data)?;
        Ok(())
    }

    fn contains(&self, relative_path: &str) -> bool {
        self.full_path(relative_path).is_file()
    }
}
