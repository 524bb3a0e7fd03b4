//! Composite datasets.

use super::DataObject;

/// Tree of optional child datasets.
///
/// Flat indices number the tree depth-first: the multiblock itself is 0 and
/// every child (empty slots included) takes the next index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultiBlock {
    blocks: Vec<Option<DataObject>>,
}

impl MultiBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, block: Option<DataObject>) {
        self.blocks.push(block);
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn block(&self, i: usize) -> Option<&DataObject> {
        self.blocks.get(i).and_then(Option::as_ref)
    }

    /// Non-composite leaves with their flat index, depth-first.
    pub fn leaves(&self) -> Vec<(usize, &DataObject)> {
        let mut out = Vec::new();
        let mut next = 1;
        self.collect_leaves(&mut next, &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, next: &mut usize, out: &mut Vec<(usize, &'a DataObject)>) {
        for block in &self.blocks {
            let index = *next;
            *next += 1;
            match block {
                Some(DataObject::MultiBlock(mb)) => mb.collect_leaves(next, out),
                Some(leaf) => out.push((index, leaf)),
                None => {}
            }
        }
    }

    pub fn memory_size(&self) -> usize {
        self.blocks.iter().flatten().map(DataObject::memory_size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{ImageData, PolyData};

    #[test]
    fn test_flat_indices() {
        let mut inner = MultiBlock::new();
        inner.push(Some(DataObject::PolyData(PolyData::new())));
        inner.push(None);

        let mut root = MultiBlock::new();
        root.push(Some(DataObject::ImageData(ImageData::new([1, 1, 1]))));
        root.push(Some(DataObject::MultiBlock(inner)));
        root.push(Some(DataObject::PolyData(PolyData::new())));

        // root=0, image=1, inner=2, inner.poly=3, inner.none=4, poly=5
        let idx: Vec<usize> = root.leaves().iter().map(|(i, _)| *i).collect();
        assert_eq!(idx, vec![1, 3, 5]);
    }
}
