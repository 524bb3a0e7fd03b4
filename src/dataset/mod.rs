//! In-memory datasets: arrays, cells, attributes and the dataset kinds.
//!
//! - [`DataArray`] - named typed array of tuples
//! - [`CellArray`] - variable-length connectivity
//! - [`DataSetAttributes`] - arrays attached to points or cells
//! - [`PolyData`], [`ImageData`], [`MultiBlock`] wrapped by [`DataObject`]

mod array;
mod attributes;
mod cells;
mod image_data;
mod multiblock;
mod polydata;
pub mod sources;

pub use array::{ArrayValues, DataArray};
pub use attributes::{AttributeRole, DataSetAttributes};
pub use cells::CellArray;
pub use image_data::ImageData;
pub use multiblock::MultiBlock;
pub use polydata::PolyData;

/// Any dataset a mapper or texture can reference.
#[derive(Clone, Debug, PartialEq)]
pub enum DataObject {
    PolyData(PolyData),
    ImageData(ImageData),
    MultiBlock(MultiBlock),
}

impl DataObject {
    /// Class name written to manifests.
    pub const fn class_name(&self) -> &'static str {
        match self {
            Self::PolyData(_) => "vtkPolyData",
            Self::ImageData(_) => "vtkImageData",
            Self::MultiBlock(_) => "vtkMultiBlockDataSet",
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Self::MultiBlock(_))
    }

    /// True if there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::PolyData(pd) => pd.num_points() == 0,
            Self::ImageData(img) => img.num_points() == 0,
            Self::MultiBlock(mb) => mb.leaves().iter().all(|(_, leaf)| leaf.is_empty()),
        }
    }

    pub fn memory_size(&self) -> usize {
        match self {
            Self::PolyData(pd) => pd.memory_size(),
            Self::ImageData(img) => img.memory_size(),
            Self::MultiBlock(mb) => mb.memory_size(),
        }
    }

    pub fn as_poly_data(&self) -> Option<&PolyData> {
        match self {
            Self::PolyData(pd) => Some(pd),
            _ => None,
        }
    }

    pub fn as_image_data(&self) -> Option<&ImageData> {
        match self {
            Self::ImageData(img) => Some(img),
            _ => None,
        }
    }
}

impl From<PolyData> for DataObject {
    fn from(pd: PolyData) -> Self {
        Self::PolyData(pd)
    }
}

impl From<ImageData> for DataObject {
    fn from(img: ImageData) -> Self {
        Self::ImageData(img)
    }
}

impl From<MultiBlock> for DataObject {
    fn from(mb: MultiBlock) -> Self {
        Self::MultiBlock(mb)
    }
}
