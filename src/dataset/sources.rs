//! Procedural datasets for demos and tests.

use std::f32::consts::PI;

use super::{AttributeRole, DataArray, ImageData, PolyData};

/// UV sphere with point normals, texture coordinates and an `Elevation` scalar.
///
/// `theta` is the number of longitude segments, `phi` the number of latitude
/// rings (both clamped to at least 3).
pub fn sphere(radius: f32, theta: usize, phi: usize) -> PolyData {
    let theta = theta.max(3);
    let phi = phi.max(3);

    let mut points: Vec<[f32; 3]> = Vec::with_capacity((theta + 1) * (phi + 1));
    let mut normals = Vec::with_capacity(points.capacity() * 3);
    let mut tcoords = Vec::with_capacity(points.capacity() * 2);
    let mut elevation = Vec::with_capacity(points.capacity());

    for j in 0..=phi {
        let v = j as f32 / phi as f32;
        let polar = v * PI;
        for i in 0..=theta {
            let u = i as f32 / theta as f32;
            let azimuth = u * 2.0 * PI;
            let n = [polar.sin() * azimuth.cos(), polar.sin() * azimuth.sin(), polar.cos()];
            points.push([n[0] * radius, n[1] * radius, n[2] * radius]);
            normals.extend_from_slice(&n);
            tcoords.extend_from_slice(&[u, 1.0 - v]);
            elevation.push(n[2] * radius);
        }
    }

    let row = theta as i64 + 1;
    let mut triangles = Vec::with_capacity(theta * phi * 2);
    for j in 0..phi as i64 {
        for i in 0..theta as i64 {
            let a = j * row + i;
            let b = a + 1;
            let c = a + row;
            let d = c + 1;
            if j > 0 {
                triangles.push([a, c, b]);
            }
            if j < phi as i64 - 1 {
                triangles.push([b, c, d]);
            }
        }
    }

    let mut pd = PolyData::from_triangles(&points, &triangles);
    pd.point_data
        .add_active(AttributeRole::Normals, DataArray::from_f32("Normals", 3, normals));
    pd.point_data
        .add_active(AttributeRole::TCoords, DataArray::from_f32("TCoords", 2, tcoords));
    pd.point_data
        .add_active(AttributeRole::Scalars, DataArray::from_f32("Elevation", 1, elevation));
    pd
}

/// Flat grid of `nx` × `ny` quads split into triangles, in the z=0 plane.
pub fn plane(size: f32, nx: usize, ny: usize) -> PolyData {
    let nx = nx.max(1);
    let ny = ny.max(1);
    let mut points = Vec::with_capacity((nx + 1) * (ny + 1));
    let mut tcoords = Vec::with_capacity(points.capacity() * 2);
    for j in 0..=ny {
        for i in 0..=nx {
            let u = i as f32 / nx as f32;
            let v = j as f32 / ny as f32;
            points.push([(u - 0.5) * size, (v - 0.5) * size, 0.0]);
            tcoords.extend_from_slice(&[u, v]);
        }
    }
    let row = nx as i64 + 1;
    let mut triangles = Vec::with_capacity(nx * ny * 2);
    for j in 0..ny as i64 {
        for i in 0..nx as i64 {
            let a = j * row + i;
            triangles.push([a, a + 1, a + row + 1]);
            triangles.push([a, a + row + 1, a + row]);
        }
    }
    let mut pd = PolyData::from_triangles(&points, &triangles);
    pd.point_data
        .add_active(AttributeRole::TCoords, DataArray::from_f32("TCoords", 2, tcoords));
    pd
}

/// RGBA checkerboard texture with `cell`-pixel squares.
pub fn checkerboard(width: usize, height: usize, cell: usize) -> ImageData {
    let cell = cell.max(1);
    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let on = ((x / cell) + (y / cell)) % 2 == 0;
            let shade = if on { 230 } else { 40 };
            pixels.extend_from_slice(&[shade, shade / 2, 255 - shade, 255]);
        }
    }
    ImageData::from_rgba(width, height, pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_is_consistent() {
        let s = sphere(1.0, 16, 8);
        assert_eq!(s.num_points(), 17 * 9);
        assert_eq!(s.polys.num_cells(), 16 * 8 * 2 - 2 * 16);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_plane_is_flat() {
        let p = plane(2.0, 4, 4);
        assert_eq!(p.num_points(), 25);
        assert_eq!(p.polys.num_cells(), 32);
        assert_eq!(p.bounds().size().z, 0.0);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_checkerboard_pixels() {
        let img = checkerboard(8, 4, 2);
        assert_eq!(img.dimensions(), [8, 4, 1]);
        let rgba = img.to_rgba_image().unwrap();
        assert_ne!(rgba.get_pixel(0, 0), rgba.get_pixel(2, 0));
    }
}
