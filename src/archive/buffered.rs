//! Single-buffer in-memory archive: one zip holding every entry.

use std::collections::HashSet;
use std::io::{self, Write};

use tracing::{debug, warn};

use super::zip::ZipWriter;
use super::{ArchiveSink, SinkState, DEFAULT_BUFFER_SIZE};
use crate::util::{Error, Result};

/// Growable byte buffer that refuses to grow past a fixed capacity.
pub(crate) struct BoundedBuffer {
    data: Vec<u8>,
    capacity: usize,
    overflow: Option<usize>,
}

impl BoundedBuffer {
    pub(crate) fn with_initial(initial: usize, capacity: usize) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(initial.min(capacity))
            .map_err(|_| Error::Allocation(initial))?;
        Ok(Self { data, capacity, overflow: None })
    }

    /// Drop bytes past `len`, e.g. a partially written entry.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    /// Lift the bound so the central directory of kept entries can be written.
    fn release(&mut self) {
        self.capacity = usize::MAX;
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl Write for BoundedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let requested = self.data.len() + buf.len();
        if requested > self.capacity {
            self.overflow = Some(requested);
            return Err(io::Error::new(io::ErrorKind::OutOfMemory, "archive capacity exceeded"));
        }
        if self.data.try_reserve(buf.len()).is_err() {
            self.overflow = Some(requested);
            return Err(io::Error::new(io::ErrorKind::OutOfMemory, "buffer growth failed"));
        }
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes all entries into a single zip held in memory.
///
/// A failed write poisons the sink: the partial entry is cut off, every
/// later insert fails with [`Error::CapacityExceeded`], and `close` still
/// finishes the zip with the entries stored before the failure.
pub struct BufferedArchive {
    name: String,
    initial_size: usize,
    max_capacity: usize,
    state: SinkState,
    writer: Option<ZipWriter<BoundedBuffer>>,
    buffer: Option<Vec<u8>>,
    entries: HashSet<String>,
    poisoned: Option<usize>,
}

impl BufferedArchive {
    /// Create an unbounded buffered archive.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_capacity(name, usize::MAX)
    }

    /// Create a buffered archive that may grow up to `max_capacity` bytes.
    pub fn with_capacity(name: impl Into<String>, max_capacity: usize) -> Self {
        Self {
            name: name.into(),
            initial_size: DEFAULT_BUFFER_SIZE,
            max_capacity,
            state: SinkState::Created,
            writer: None,
            buffer: None,
            entries: HashSet::new(),
            poisoned: None,
        }
    }

    /// Set the size allocated by `open`.
    pub fn set_initial_size(&mut self, size: usize) {
        self.initial_size = size;
    }

    /// Archive name (used in log messages only).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finished zip bytes; available after `close`.
    pub fn buffer(&self) -> Option<&[u8]> {
        self.buffer.as_deref()
    }

    /// Size of the finished zip, 0 before `close`.
    pub fn buffer_size(&self) -> usize {
        self.buffer.as_ref().map_or(0, Vec::len)
    }

    /// Take the finished zip bytes.
    pub fn into_buffer(self) -> Option<Vec<u8>> {
        self.buffer
    }

    /// Number of entries inserted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was inserted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True once a write failure made the sink unusable.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    fn capacity_error(&self) -> Error {
        Error::CapacityExceeded {
            capacity: self.max_capacity,
            requested: self.poisoned.unwrap_or(self.max_capacity),
        }
    }

    fn poison(&mut self, err: Error) -> Error {
        let requested = match self.writer.as_mut() {
            Some(w) => {
                let kept = w.offset() as usize;
                w.get_mut().truncate(kept);
                w.get_ref().overflow.unwrap_or(self.max_capacity)
            }
            None => self.max_capacity,
        };
        self.poisoned = Some(requested);
        warn!("buffered archive '{}' refuses further entries: {}", self.name, err);
        self.capacity_error()
    }
}

impl ArchiveSink for BufferedArchive {
    fn open(&mut self) -> Result<()> {
        let buffer = BoundedBuffer::with_initial(self.initial_size, self.max_capacity)?;
        self.writer = Some(ZipWriter::new(buffer));
        self.buffer = None;
        self.entries.clear();
        self.poisoned = None;
        self.state = SinkState::Open;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        match self.state {
            SinkState::Closed => return Err(Error::ArchiveClosed(self.name.clone())),
            SinkState::Created => return Err(Error::ArchiveNotOpen(self.name.clone())),
            SinkState::Open => {}
        }
        self.state = SinkState::Closed;
        let mut writer = self
            .writer
            .take()
            .ok_or_else(|| Error::ArchiveNotOpen(self.name.clone()))?;
        if self.poisoned.is_some() {
            writer.get_mut().release();
        }
        let buffer = writer.finish()?.into_inner();
        debug!(
            "closed buffered archive '{}': {} entries, {} bytes",
            self.name,
            self.entries.len(),
            buffer.len()
        );
        self.buffer = Some(buffer);
        match self.poisoned {
            Some(_) => Err(self.capacity_error()),
            None => Ok(()),
        }
    }

    fn insert(&mut self, relative_path: &str, data: &[u8]) -> Result<()> {
        match self.state {
            SinkState::Created => return Err(Error::ArchiveNotOpen(self.name.clone())),
            SinkState::Closed => return Err(Error::ArchiveClosed(self.name.clone())),
            SinkState::Open => {}
        }
        if self.poisoned.is_some() {
            return Err(self.capacity_error());
        }
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| Error::ArchiveNotOpen(self.name.clone()))?;
        match writer.add_entry(relative_path, data) {
            Ok(()) => {
                self.entries.insert(relative_path.to_string());
                Ok(())
            }
            Err(err @ Error::Io(_)) => Err(self.poison(err)),
            Err(err) => Err(err),
        }
    }

    fn contains(&self, relative_path: &str) -> bool {
        self.entries.contains(relative_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::zip::read_entries;

    #[test]
    fn test_buffered_roundtrip() -> Result<()> {
        let mut archive = BufferedArchive::new("scene");
        archive.open()?;
        archive.insert("index.json", b"{\"version\":1}")?;
        archive.insert("data/blob", &[7u8; 256])?;
        assert!(archive.contains("data/blob"));
        assert_eq!(archive.buffer_size(), 0);
        archive.close()?;

        let entries = read_entries(archive.buffer().unwrap())?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].data, vec![7u8; 256]);
        Ok(())
    }

    #[test]
    fn test_capacity_exhaustion_is_fatal() -> Result<()> {
        let mut archive = BufferedArchive::with_capacity("tiny", 128);
        archive.open()?;
        archive.insert("a", b"small")?;

        // Incompressible-ish payload larger than the whole capacity
        let big: Vec<u8> = (0..4096u32).map(|i| (i.wrapping_mul(2654435761) >> 13) as u8).collect();
        assert!(matches!(archive.insert("b", &big), Err(Error::CapacityExceeded { .. })));
        assert!(archive.is_poisoned());

        // Even tiny inserts fail afterwards
        assert!(matches!(archive.insert("c", b"x"), Err(Error::CapacityExceeded { .. })));
        assert!(!archive.contains("b"));
        assert!(matches!(archive.close(), Err(Error::CapacityExceeded { .. })));

        // Entries stored before the overflow are kept
        let entries = read_entries(archive.buffer().unwrap())?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "a");
        assert_eq!(entries[0].data, b"small");
        Ok(())
    }

    #[test]
    fn test_rejected_name_keeps_sink_usable() -> Result<()> {
        let mut archive = BufferedArchive::new("names");
        archive.open()?;
        let long = "n".repeat(usize::from(u16::MAX) + 1);
        assert!(matches!(archive.insert(&long, b"x"), Err(Error::Zip(_))));
        assert!(!archive.is_poisoned());

        archive.insert("ok", b"fine")?;
        archive.close()?;
        let entries = read_entries(archive.buffer().unwrap())?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "ok");
        Ok(())
    }

    #[test]
    fn test_close_once() -> Result<()> {
        let mut archive = BufferedArchive::new("once");
        assert!(matches!(archive.insert("a", b""), Err(Error::ArchiveNotOpen(_))));
        archive.open()?;
        archive.close()?;
        assert!(matches!(archive.close(), Err(Error::ArchiveClosed(_))));
        assert!(matches!(archive.insert("a", b""), Err(Error::ArchiveClosed(_))));
        Ok(())
    }
}
