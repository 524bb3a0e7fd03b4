//! Variable-length cell connectivity.

use super::DataArray;

/// Cell list stored as offsets + connectivity.
///
/// `offsets` always starts with 0 and has one more entry than there are
/// cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellArray {
    offsets: Vec<usize>,
    connectivity: Vec<i64>,
}

impl Default for CellArray {
    fn default() -> Self {
        Self::new()
    }
}

impl CellArray {
    pub fn new() -> Self {
        Self {
            offsets: vec![0],
            connectivity: Vec::new(),
        }
    }

    /// Build from cells given as point id slices.
    pub fn from_cells<'a>(cells: impl IntoIterator<Item = &'a [i64]>) -> Self {
        let mut out = Self::new();
        for cell in cells {
            out.push_cell(cell);
        }
        out
    }

    /// Parse a legacy flat list `[n, id0, .., idn-1, n, ...]`.
    ///
    /// Returns `None` if a count runs past the end of the list.
    pub fn from_legacy(flat: &[i64]) -> Option<Self> {
        let mut out = Self::new();
        let mut i = 0;
        while i < flat.len() {
            let n = usize::try_from(flat[i]).ok()?;
            let cell = flat.get(i + 1..i + 1 + n)?;
            out.push_cell(cell);
            i += n + 1;
        }
        Some(out)
    }

    pub fn push_cell(&mut self, ids: &[i64]) {
        self.connectivity.extend_from_slice(ids);
        self.offsets.push(self.connectivity.len());
    }

    pub fn num_cells(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.num_cells() == 0
    }

    /// Point ids of cell `i`.
    pub fn cell(&self, i: usize) -> &[i64] {
        &self.connectivity[self.offsets[i]..self.offsets[i + 1]]
    }

    /// Iterate cells in order.
    pub fn iter(&self) -> impl Iterator<Item = &[i64]> + '_ {
        (0..self.num_cells()).map(move |i| self.cell(i))
    }

    /// Total number of point ids across cells.
    pub fn connectivity_len(&self) -> usize {
        self.connectivity.len()
    }

    /// Legacy flat representation `[n, ids..., n, ids...]`.
    pub fn to_legacy(&self) -> Vec<i64> {
        let mut out = Vec::with_capacity(self.connectivity.len() + self.num_cells());
        for cell in self.iter() {
            out.push(cell.len() as i64);
            out.extend_from_slice(cell);
        }
        out
    }

    /// Legacy flat list as a 64-bit id array (narrowed on export).
    pub fn legacy_array(&self, name: &str) -> DataArray {
        DataArray::from_i64(name, 1, self.to_legacy())
    }

    /// Bytes held in memory (offsets and connectivity as 64-bit ids).
    pub fn memory_size(&self) -> usize {
        (self.offsets.len() + self.connectivity.len()) * std::mem::size_of::<i64>()
    }

    /// Largest referenced point id.
    pub fn max_id(&self) -> Option<i64> {
        self.connectivity.iter().copied().max()
    }
}
