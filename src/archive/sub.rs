//! Sub-archive decorator: a sink view under a path prefix of another sink.

use super::{join_path, ArchiveSink};
use crate::util::Result;

/// Forwards inserts into a parent sink under `prefix/`.
///
/// The parent stays open across the sub-archive's `open`/`close`; its own
/// lifecycle belongs to whoever owns it.
pub struct SubArchive<'a> {
    parent: &'a mut dyn ArchiveSink,
    prefix: String,
}

impl<'a> SubArchive<'a> {
    /// Wrap `parent` so that every path lands under `prefix`.
    pub fn new(parent: &'a mut dyn ArchiveSink, prefix: impl Into<String>) -> Self {
        Self {
            parent,
            prefix: prefix.into(),
        }
    }

    /// Path prefix applied to every entry.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl ArchiveSink for SubArchive<'_> {
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn insert(&mut self, relative_path: &str, data: &[u8]) -> Result<()> {
        let path = join_path(&self.prefix, relative_path);
        self.parent.insert(&path, data)
    }

    fn contains(&self, relative_path: &str) -> bool {
        self.parent.contains(&join_path(&self.prefix, relative_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::PartitionedArchive;

    #[test]
    fn test_prefix_forwarding() -> Result<()> {
        let mut parent = PartitionedArchive::new();
        {
            let mut sub = SubArchive::new(&mut parent, "3");
            sub.open()?;
            sub.insert("index.json", b"{}")?;
            assert!(sub.contains("index.json"));
            assert!(!sub.contains("data/x"));
            sub.close()?;
        }
        assert!(parent.contains("3/index.json"));
        assert_eq!(parent.buffer_name(0), Some("3/index.json"));
        Ok(())
    }

    #[test]
    fn test_nested_sub_archives() -> Result<()> {
        let mut parent = PartitionedArchive::new();
        let mut outer = SubArchive::new(&mut parent, "a");
        let mut inner = SubArchive::new(&mut outer, "b");
        inner.insert("c", b"1")?;
        drop(inner);
        drop(outer);
        assert!(parent.contains("a/b/c"));
        Ok(())
    }
}
