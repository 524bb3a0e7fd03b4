//! Polygonal datasets.

use super::{CellArray, DataArray, DataSetAttributes};
use crate::util::{BBox3d, DVec3, Error, Result};

/// Points plus vertex, line, polygon and triangle-strip cells.
///
/// Cell ordering for cell data follows vertices, lines, polygons, strips.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PolyData {
    points: Option<DataArray>,
    pub verts: CellArray,
    pub lines: CellArray,
    pub polys: CellArray,
    pub strips: CellArray,
    pub point_data: DataSetAttributes,
    pub cell_data: DataSetAttributes,
}

impl PolyData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dataset with the given 3-component point coordinates.
    pub fn with_points(points: DataArray) -> Self {
        let mut pd = Self::new();
        pd.set_points(points);
        pd
    }

    /// Triangle mesh from `f32` positions and index triples.
    pub fn from_triangles(points: &[[f32; 3]], triangles: &[[i64; 3]]) -> Self {
        let flat: &[f32] = bytemuck::cast_slice(points);
        let mut pd = Self::with_points(DataArray::from_f32("points", 3, flat.to_vec()));
        for tri in triangles {
            pd.polys.push_cell(tri);
        }
        pd
    }

    /// Replace the point coordinates. Arrays are forced to 3 components.
    pub fn set_points(&mut self, points: DataArray) {
        let points = if points.components() == 3 {
            points
        } else {
            DataArray::new(points.name(), 3, points.values().clone())
        };
        self.points = Some(points);
    }

    pub fn points(&self) -> Option<&DataArray> {
        self.points.as_ref()
    }

    pub fn num_points(&self) -> usize {
        self.points.as_ref().map_or(0, DataArray::num_tuples)
    }

    /// Coordinates of point `i`.
    pub fn point(&self, i: usize) -> DVec3 {
        match &self.points {
            Some(p) => DVec3::new(p.component(i, 0), p.component(i, 1), p.component(i, 2)),
            None => DVec3::ZERO,
        }
    }

    /// Total cell count across the four cell lists.
    pub fn num_cells(&self) -> usize {
        self.verts.num_cells() + self.lines.num_cells() + self.polys.num_cells() + self.strips.num_cells()
    }

    /// True if the dataset carries a point set.
    pub fn is_valid(&self) -> bool {
        self.points.is_some()
    }

    pub fn bounds(&self) -> BBox3d {
        let mut b = BBox3d::EMPTY;
        for i in 0..self.num_points() {
            b.expand_by_point(self.point(i));
        }
        b
    }

    /// Approximate in-memory footprint in bytes.
    pub fn memory_size(&self) -> usize {
        self.points.as_ref().map_or(0, DataArray::memory_size)
            + self.verts.memory_size()
            + self.lines.memory_size()
            + self.polys.memory_size()
            + self.strips.memory_size()
            + self.point_data.memory_size()
            + self.cell_data.memory_size()
    }

    /// Check attribute counts and that every cell references existing points.
    pub fn validate(&self) -> Result<()> {
        let n = self.num_points();
        self.point_data.validate(n)?;
        self.cell_data.validate(self.num_cells())?;
        for cells in [&self.verts, &self.lines, &self.polys, &self.strips] {
            if let Some(max) = cells.max_id() {
                if max < 0 || max as usize >= n {
                    return Err(Error::invalid(format!("cell references point {max} of {n}")));
                }
            }
        }
        Ok(())
    }
}
