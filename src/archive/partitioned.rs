//! Partitioned in-memory archive: one zip buffer per inserted path.

use std::collections::HashMap;

use tracing::warn;

use super::zip::ZipWriter;
use super::{ArchiveSink, DEFAULT_BUFFER_SIZE};
use crate::util::{Error, Result};

struct Partition {
    name: String,
    data: Vec<u8>,
}

/// Stores each insert as an independent single-entry zip.
///
/// `open` and `close` are no-ops; buffers are addressable by path or by
/// insertion index.
#[derive(Default)]
pub struct PartitionedArchive {
    partitions: Vec<Partition>,
    index: HashMap<String, usize>,
    min_buffer_size: usize,
}

impl PartitionedArchive {
    /// Create an empty archive.
    pub fn new() -> Self {
        Self {
            min_buffer_size: DEFAULT_BUFFER_SIZE,
            ..Default::default()
        }
    }

    /// Minimum allocation per partition.
    pub fn set_min_buffer_size(&mut self, size: usize) {
        self.min_buffer_size = size;
    }

    /// Number of buffers produced so far.
    pub fn number_of_buffers(&self) -> usize {
        self.partitions.len()
    }

    /// Zip bytes of the partition stored under `name`.
    pub fn buffer(&self, name: &str) -> Option<&[u8]> {
        self.index.get(name).map(|&i| self.partitions[i].data.as_slice())
    }

    /// Zip bytes of the `i`-th partition.
    pub fn buffer_at(&self, i: usize) -> Option<&[u8]> {
        self.partitions.get(i).map(|p| p.data.as_slice())
    }

    /// Size of the partition stored under `name`, 0 if absent.
    pub fn buffer_size(&self, name: &str) -> usize {
        self.buffer(name).map_or(0, <[u8]>::len)
    }

    /// Path of the `i`-th partition.
    pub fn buffer_name(&self, i: usize) -> Option<&str> {
        self.partitions.get(i).map(|p| p.name.as_str())
    }

    /// Iterate `(name, zip bytes)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.partitions.iter().map(|p| (p.name.as_str(), p.data.as_slice()))
    }

    fn build_partition(&self, relative_path: &str, data: &[u8]) -> Result<Vec<u8>> {
        let size = data.len().max(self.min_buffer_size);
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(size).map_err(|_| Error::Allocation(size))?;
        let mut zip = ZipWriter::new(buffer);
        zip.add_entry(relative_path, data)?;
        zip.finish()
    }
}

impl ArchiveSink for PartitionedArchive {
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn insert(&mut self, relative_path: &str, data: &[u8]) -> Result<()> {
        let buffer = self.build_partition(relative_path, data).map_err(|err| {
            warn!("partition '{}' not written: {}", relative_path, err);
            err
        })?;
        match self.index.get(relative_path) {
            Some(&i) => self.partitions[i].data = buffer,
            None => {
                self.index.insert(relative_path.to_string(), self.partitions.len());
                self.partitions.push(Partition {
                    name: relative_path.to_string(),
                    data: buffer,
                });
            }
        }
        Ok(())
    }

    fn contains(&self, relative_path: &str) -> bool {
        self.index.contains_key(relative_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::zip::read_entries;

    #[test]
    fn test_partitions_are_isolated() -> Result<()> {
        let mut archive = PartitionedArchive::new();
        archive.open()?;
        archive.insert("index.json", b"{\"a\":1}")?;
        archive.insert("data/xyz", &[3u8; 1000])?;
        archive.close()?;

        assert_eq!(archive.number_of_buffers(), 2);
        assert_eq!(archive.buffer_name(0), Some("index.json"));
        assert_eq!(archive.buffer_name(1), Some("data/xyz"));

        let first = read_entries(archive.buffer("index.json").unwrap())?;
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].data, b"{\"a\":1}");

        let second = read_entries(archive.buffer_at(1).unwrap())?;
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].name, "data/xyz");
        assert_eq!(second[0].data, vec![3u8; 1000]);
        assert!(archive.buffer_size("data/xyz") > 0);
        assert_eq!(archive.buffer_size("missing"), 0);
        Ok(())
    }

    #[test]
    fn test_contains_tracks_inserts() -> Result<()> {
        let mut archive = PartitionedArchive::new();
        assert!(!archive.contains("a"));
        archive.insert("a", b"1")?;
        assert!(archive.contains("a"));
        archive.insert("a", b"2")?;
        assert_eq!(archive.number_of_buffers(), 1);
        assert_eq!(read_entries(archive.buffer("a").unwrap())?[0].data, b"2");
        Ok(())
    }
}
