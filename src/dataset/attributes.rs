//! Point and cell attribute collections with active roles.

use super::DataArray;
use crate::util::{Error, Result};

/// Default role an attribute array can be marked active for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeRole {
    Scalars,
    Vectors,
    Normals,
    TCoords,
    Tensors,
    GlobalIds,
    PedigreeIds,
}

impl AttributeRole {
    /// All roles in manifest order.
    pub const ALL: [Self; 7] = [
        Self::TCoords,
        Self::Scalars,
        Self::Normals,
        Self::GlobalIds,
        Self::Tensors,
        Self::PedigreeIds,
        Self::Vectors,
    ];

    /// Manifest key holding the active index, e.g. `activeScalars`.
    pub const fn manifest_key(self) -> &'static str {
        match self {
            Self::Scalars => "activeScalars",
            Self::Vectors => "activeVectors",
            Self::Normals => "activeNormals",
            Self::TCoords => "activeTCoords",
            Self::Tensors => "activeTensors",
            Self::GlobalIds => "activeGlobalIds",
            Self::PedigreeIds => "activePedigreeIds",
        }
    }

    /// Setter the web viewer uses to register an array in this role.
    pub const fn registration(self) -> &'static str {
        match self {
            Self::Scalars => "setScalars",
            Self::Vectors => "setVectors",
            Self::Normals => "setNormals",
            Self::TCoords => "setTCoords",
            Self::Tensors => "setTensors",
            Self::GlobalIds => "setGlobalIds",
            Self::PedigreeIds => "setPedigreeIds",
        }
    }

    const fn slot(self) -> usize {
        match self {
            Self::Scalars => 0,
            Self::Vectors => 1,
            Self::Normals => 2,
            Self::TCoords => 3,
            Self::Tensors => 4,
            Self::GlobalIds => 5,
            Self::PedigreeIds => 6,
        }
    }
}

/// Ordered list of arrays plus at most one active array per role.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataSetAttributes {
    arrays: Vec<DataArray>,
    active: [Option<usize>; 7],
}

impl DataSetAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an array, returning its index.
    pub fn add_array(&mut self, array: DataArray) -> usize {
        self.arrays.push(array);
        self.arrays.len() - 1
    }

    /// Append an array and make it active for `role`.
    pub fn add_active(&mut self, role: AttributeRole, array: DataArray) -> usize {
        let idx = self.add_array(array);
        self.active[role.slot()] = Some(idx);
        idx
    }

    /// Mark array `idx` active for `role`; `None` clears the role.
    pub fn set_active(&mut self, role: AttributeRole, idx: Option<usize>) {
        self.active[role.slot()] = idx.filter(|&i| i < self.arrays.len());
    }

    /// Index of the array active for `role`.
    pub fn active_index(&self, role: AttributeRole) -> Option<usize> {
        self.active[role.slot()]
    }

    /// Array active for `role`.
    pub fn active(&self, role: AttributeRole) -> Option<&DataArray> {
        self.active_index(role).map(|i| &self.arrays[i])
    }

    /// Role array `idx` is active for, if any (first match in manifest order).
    pub fn role_of(&self, idx: usize) -> Option<AttributeRole> {
        AttributeRole::ALL
            .into_iter()
            .find(|r| self.active_index(*r) == Some(idx))
    }

    pub fn arrays(&self) -> &[DataArray] {
        &self.arrays
    }

    pub fn array(&self, idx: usize) -> Option<&DataArray> {
        self.arrays.get(idx)
    }

    /// First array named `name`.
    pub fn array_by_name(&self, name: &str) -> Option<&DataArray> {
        self.arrays.iter().find(|a| a.name() == Some(name))
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Bytes held in memory by all arrays.
    pub fn memory_size(&self) -> usize {
        self.arrays.iter().map(DataArray::memory_size).sum()
    }

    /// Check every array holds exactly `tuples` tuples.
    pub fn validate(&self, tuples: usize) -> Result<()> {
        for (i, a) in self.arrays.iter().enumerate() {
            if a.num_tuples() != tuples || a.len() % a.components() != 0 {
                return Err(Error::InvalidArray {
                    name: a.name().map_or_else(|| format!("#{i}"), str::to_string),
                    reason: format!(
                        "{} values with {} components, expected {} tuples",
                        a.len(),
                        a.components(),
                        tuples
                    ),
                });
            }
        }
        Ok(())
    }

    /// Attributes of tuples `indices`, keeping names and active roles.
    pub fn gather(&self, indices: &[usize]) -> Self {
        Self {
            arrays: self.arrays.iter().map(|a| a.gather(indices)).collect(),
            active: self.active,
        }
    }
}
