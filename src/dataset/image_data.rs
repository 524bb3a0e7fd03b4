//! Uniform grid datasets (also used for texture images).

use image::RgbaImage;

use super::{AttributeRole, DataArray, DataSetAttributes};
use crate::util::ArrayKind;

/// Axis-aligned uniform grid.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageData {
    pub spacing: [f64; 3],
    pub origin: [f64; 3],
    extent: [i32; 6],
    pub point_data: DataSetAttributes,
    pub cell_data: DataSetAttributes,
}

impl Default for ImageData {
    fn default() -> Self {
        Self::new([0, 0, 0])
    }
}

impl ImageData {
    /// Grid with `dims` points per axis, unit spacing, origin at zero.
    pub fn new(dims: [usize; 3]) -> Self {
        let hi = |d: usize| d as i32 - 1;
        Self {
            spacing: [1.0; 3],
            origin: [0.0; 3],
            extent: [0, hi(dims[0]), 0, hi(dims[1]), 0, hi(dims[2])],
            point_data: DataSetAttributes::new(),
            cell_data: DataSetAttributes::new(),
        }
    }

    /// 2D RGBA image with `Uint8` scalars, 4 components.
    pub fn from_rgba(width: usize, height: usize, pixels: Vec<u8>) -> Self {
        let mut img = Self::new([width, height, 1]);
        img.point_data
            .add_active(AttributeRole::Scalars, DataArray::from_u8("rgba", 4, pixels));
        img
    }

    /// Copy of an `image` crate buffer.
    pub fn from_rgba_image(img: &RgbaImage) -> Self {
        Self::from_rgba(img.width() as usize, img.height() as usize, img.as_raw().clone())
    }

    pub fn extent(&self) -> [i32; 6] {
        self.extent
    }

    pub fn set_extent(&mut self, extent: [i32; 6]) {
        self.extent = extent;
    }

    /// Points per axis.
    pub fn dimensions(&self) -> [usize; 3] {
        let d = |lo: i32, hi: i32| (hi - lo + 1).max(0) as usize;
        [
            d(self.extent[0], self.extent[1]),
            d(self.extent[2], self.extent[3]),
            d(self.extent[4], self.extent[5]),
        ]
    }

    pub fn num_points(&self) -> usize {
        self.dimensions().iter().product()
    }

    /// True if the grid has at least one point.
    pub fn is_valid(&self) -> bool {
        self.num_points() > 0
    }

    pub fn memory_size(&self) -> usize {
        self.point_data.memory_size() + self.cell_data.memory_size()
    }

    /// Active scalars as an RGBA image.
    ///
    /// Accepts `Uint8` scalars with 1 (luminance), 3 (RGB) or 4 (RGBA)
    /// components on a 2D grid; anything else yields `None`.
    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        let [w, h, d] = self.dimensions();
        if d != 1 || w == 0 || h == 0 {
            return None;
        }
        let scalars = self.point_data.active(AttributeRole::Scalars)?;
        if scalars.kind() != ArrayKind::Uint8 || scalars.num_tuples() != w * h {
            return None;
        }
        let nc = scalars.components();
        let mut out = Vec::with_capacity(w * h * 4);
        for t in 0..w * h {
            let c = |i: usize| scalars.component(t, i) as u8;
            match nc {
                1 => out.extend_from_slice(&[c(0), c(0), c(0), 255]),
                3 => out.extend_from_slice(&[c(0), c(1), c(2), 255]),
                4 => out.extend_from_slice(&[c(0), c(1), c(2), c(3)]),
                _ => return None,
            }
        }
        RgbaImage::from_raw(w as u32, h as u32, out)
    }
}
