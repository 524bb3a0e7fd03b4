//! Quadric clustering decimation.
//!
//! Points are binned into a regular grid over the bounding box. Every bin
//! becomes one output point placed where the summed plane quadrics of its
//! incident triangles are minimal. Cells collapse onto bins; degenerate ones
//! are dropped.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::dataset::{CellArray, DataArray, PolyData};
use crate::util::{BBox3d, DMat3, DVec3, Error, Result};

/// Accumulated plane quadric of one bin (`A`, `b` of `xᵀAx + 2bᵀx`) plus the point mean.
#[derive(Clone, Copy, Debug)]
struct Quadric {
    a: DMat3,
    b: DVec3,
    sum: DVec3,
    count: u32,
}

impl Default for Quadric {
    fn default() -> Self {
        Self {
            a: DMat3::ZERO,
            b: DVec3::ZERO,
            sum: DVec3::ZERO,
            count: 0,
        }
    }
}

impl Quadric {
    fn add_plane(&mut self, n: DVec3, d: f64, w: f64) {
        self.a += DMat3::from_cols(n * n.x, n * n.y, n * n.z) * w;
        self.b += n * (d * w);
    }

    /// Quadric minimizer, or the mean of the binned points when the system is
    /// singular or the minimizer leaves the neighbourhood of the bin.
    fn solve(&self, bin_diagonal: f64) -> DVec3 {
        let mean = self.sum / f64::from(self.count.max(1));
        let det = self.a.determinant();
        let scale = self.a.x_axis.length_squared() + self.a.y_axis.length_squared() + self.a.z_axis.length_squared();
        if scale == 0.0 || det.abs() <= 1e-9 * scale.powf(1.5) {
            return mean;
        }
        let x = self.a.inverse() * -self.b;
        if !x.is_finite() || x.distance(mean) > bin_diagonal {
            return mean;
        }
        x
    }
}

fn alloc_error<T>(n: usize) -> Error {
    Error::Allocation(n.saturating_mul(std::mem::size_of::<T>()))
}

/// Grid decimator with a fixed number of divisions per axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuadricClustering {
    divisions: [usize; 3],
}

impl QuadricClustering {
    pub fn new(divisions: [usize; 3]) -> Self {
        Self {
            divisions: divisions.map(|d| d.max(1)),
        }
    }

    pub fn divisions(&self) -> [usize; 3] {
        self.divisions
    }

    /// Number of grid bins.
    pub fn num_bins(&self) -> u128 {
        self.divisions.iter().map(|&d| d as u128).product()
    }

    fn bin_of(&self, p: DVec3, bounds: &BBox3d) -> u64 {
        let size = bounds.size();
        let mut idx = [0u64; 3];
        for axis in 0..3 {
            let n = self.divisions[axis];
            if size[axis] > 0.0 {
                let t = (p[axis] - bounds.min[axis]) / size[axis];
                idx[axis] = ((t * n as f64) as usize).min(n - 1) as u64;
            }
        }
        let [nx, ny, _] = self.divisions.map(|d| d as u64);
        idx[0] + nx * (idx[1] + ny * idx[2])
    }

    /// Decimate `input`. Fails with [`Error::Allocation`] when the working
    /// tables cannot be reserved.
    pub fn apply(&self, input: &PolyData) -> Result<PolyData> {
        let n = input.num_points();
        let bounds = input.bounds();
        if n == 0 || bounds.is_empty() {
            return Ok(input.clone());
        }

        // Point -> output bin index, first point of each bin.
        let mut bins: HashMap<u64, usize> = HashMap::new();
        bins.try_reserve(n.min(self.num_bins().min(usize::MAX as u128) as usize))
            .map_err(|_| alloc_error::<(u64, usize)>(n))?;
        let mut point_bin: Vec<usize> = Vec::new();
        point_bin.try_reserve_exact(n).map_err(|_| alloc_error::<usize>(n))?;
        let mut representatives: Vec<usize> = Vec::new();
        let mut quadrics: Vec<Quadric> = Vec::new();

        for i in 0..n {
            let p = input.point(i);
            let key = self.bin_of(p, &bounds);
            let bin = *bins.entry(key).or_insert_with(|| {
                representatives.push(i);
                quadrics.push(Quadric::default());
                quadrics.len() - 1
            });
            quadrics[bin].sum += p;
            quadrics[bin].count += 1;
            point_bin.push(bin);
        }

        let to_bin = |id: i64| usize::try_from(id).ok().and_then(|id| point_bin.get(id).copied());

        // Plane quadrics from every triangle of polygons and strips.
        let mut triangles: Vec<([usize; 3], usize)> = Vec::new();
        let cell_base = input.verts.num_cells() + input.lines.num_cells();
        for (c, cell) in input.polys.iter().enumerate() {
            for k in 1..cell.len().saturating_sub(1) {
                triangles.push(([cell[0], cell[k], cell[k + 1]].map(|id| id as usize), cell_base + c));
            }
        }
        let strip_base = cell_base + input.polys.num_cells();
        for (c, cell) in input.strips.iter().enumerate() {
            for k in 0..cell.len().saturating_sub(2) {
                let tri = if k % 2 == 0 {
                    [cell[k], cell[k + 1], cell[k + 2]]
                } else {
                    [cell[k + 1], cell[k], cell[k + 2]]
                };
                triangles.push((tri.map(|id| id as usize), strip_base + c));
            }
        }

        for (tri, _) in &triangles {
            if tri.iter().any(|&id| id >= n) {
                continue;
            }
            let [p0, p1, p2] = tri.map(|id| input.point(id));
            let cross = (p1 - p0).cross(p2 - p0);
            let len = cross.length();
            if len == 0.0 {
                continue;
            }
            let normal = cross / len;
            let d = -normal.dot(p0);
            for &id in tri {
                quadrics[point_bin[id]].add_plane(normal, d, len * 0.5);
            }
        }

        let bin_size = bounds.size() / DVec3::new(
            self.divisions[0] as f64,
            self.divisions[1] as f64,
            self.divisions[2] as f64,
        );
        let bin_diagonal = bin_size.length();
        let mut coords: Vec<f32> = Vec::new();
        coords
            .try_reserve_exact(quadrics.len() * 3)
            .map_err(|_| alloc_error::<f32>(quadrics.len() * 3))?;
        for q in &quadrics {
            let p = q.solve(bin_diagonal);
            coords.extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
        }

        let mut out = PolyData::with_points(DataArray::from_f32("points", 3, coords));
        let mut source_cells = Vec::new();

        // Vertices: one per bin.
        let mut seen_verts = HashSet::new();
        for (c, cell) in input.verts.iter().enumerate() {
            for &id in cell {
                if let Some(b) = to_bin(id) {
                    if seen_verts.insert(b) {
                        out.verts.push_cell(&[b as i64]);
                        source_cells.push(c);
                    }
                }
            }
        }

        // Line segments spanning two bins.
        let line_base = input.verts.num_cells();
        let mut seen_lines = HashSet::new();
        for (c, cell) in input.lines.iter().enumerate() {
            for pair in cell.windows(2) {
                let (Some(a), Some(b)) = (to_bin(pair[0]), to_bin(pair[1])) else {
                    continue;
                };
                if a != b && seen_lines.insert((a.min(b), a.max(b))) {
                    out.lines.push_cell(&[a as i64, b as i64]);
                    source_cells.push(line_base + c);
                }
            }
        }

        // Triangles spanning three bins.
        let mut seen_tris = HashSet::new();
        let mut polys = CellArray::new();
        for (tri, source) in &triangles {
            let bins = tri.map(|id| point_bin.get(id).copied());
            let [Some(a), Some(b), Some(c)] = bins else {
                continue;
            };
            if a == b || b == c || a == c {
                continue;
            }
            let mut key = [a, b, c];
            key.sort_unstable();
            if seen_tris.insert(key) {
                polys.push_cell(&[a as i64, b as i64, c as i64]);
                source_cells.push(*source);
            }
        }
        out.polys = polys;

        out.point_data = input.point_data.gather(&representatives);
        if !input.cell_data.is_empty() {
            out.cell_data = input.cell_data.gather(&source_cells);
        }

        trace!(
            divisions = ?self.divisions,
            points_in = n,
            points_out = out.num_points(),
            cells_out = out.num_cells(),
            "quadric clustering"
        );
        Ok(out)
    }
}
