//! Uniform-grid surface tessellation.

use rayon::prelude::*;
use spl_geometry::Surface;
use spl_math::Point2;

use crate::TriangleMesh;

/// Tessellate a surface on a regular `(divs_u + 1) x (divs_v + 1)` parameter
/// grid, two triangles per cell with a fixed diagonal.
///
/// Division counts below 1 are clamped to 1. Normals come from the surface's
/// first partials, one derivative evaluation per grid point; rows of the grid
/// are evaluated in parallel.
pub fn tessellate_surface_naive(
    surface: &dyn Surface,
    divs_u: usize,
    divs_v: usize,
) -> TriangleMesh {
    let divs_u = divs_u.max(1);
    let divs_v = divs_v.max(1);

    let (u_min, u_max) = surface.domain_u();
    let (v_min, v_max) = surface.domain_v();

    let rows: Vec<Vec<_>> = (0..divs_u + 1)
        .into_par_iter()
        .map(|i| {
            let u = u_min + (u_max - u_min) * i as f64 / divs_u as f64;
            (0..=divs_v)
                .map(|j| {
                    let v = v_min + (v_max - v_min) * j as f64 / divs_v as f64;
                    let (point, normal) = surface.point_and_normal_at(u, v);
                    (point, normal, Point2::new(u, v))
                })
                .collect()
        })
        .collect();

    let total = (divs_u + 1) * (divs_v + 1);
    let mut mesh = TriangleMesh {
        positions: Vec::with_capacity(total),
        normals: Vec::with_capacity(total),
        uvs: Vec::with_capacity(total),
        indices: Vec::with_capacity(divs_u * divs_v * 6),
    };

    for row in rows {
        for (point, normal, uv) in row {
            mesh.positions.push(point);
            mesh.normals.push(normal);
            mesh.uvs.push(uv);
        }
    }

    let v_count = divs_v + 1;
    for i in 0..divs_u {
        for j in 0..divs_v {
            let a = (i * v_count + j) as u32;
            let b = ((i + 1) * v_count + j) as u32;
            let c = b + 1;
            let d = a + 1;

            mesh.indices.extend_from_slice(&[a, b, c]);
            mesh.indices.extend_from_slice(&[a, c, d]);
        }
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use spl_geometry::surface::BSplineSurface;
    use spl_math::DVec3;

    fn flat_patch() -> BSplineSurface {
        BSplineSurface::new(
            1,
            1,
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0],
            vec![
                vec![DVec3::new(0.0, 0.0, 0.0), DVec3::new(0.0, 1.0, 0.0)],
                vec![DVec3::new(1.0, 0.0, 0.0), DVec3::new(1.0, 1.0, 0.0)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_naive_counts() {
        let mesh = tessellate_surface_naive(&flat_patch(), 4, 3);
        assert_eq!(mesh.vertex_count(), 5 * 4);
        assert_eq!(mesh.triangle_count(), 4 * 3 * 2);
        assert_eq!(mesh.uvs.len(), mesh.vertex_count());
        assert_eq!(mesh.normals.len(), mesh.vertex_count());
    }

    #[test]
    fn test_naive_clamps_zero_divisions() {
        let mesh = tessellate_surface_naive(&flat_patch(), 0, 0);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_naive_indices_valid() {
        let mesh = tessellate_surface_naive(&flat_patch(), 3, 3);
        let n = mesh.vertex_count() as u32;
        for &idx in &mesh.indices {
            assert!(idx < n, "Triangle index {} out of bounds (n={})", idx, n);
        }
    }

    #[test]
    fn test_naive_flat_patch_normals_and_winding_agree() {
        let mesh = tessellate_surface_naive(&flat_patch(), 2, 2);

        for n in &mesh.normals {
            assert!((n.z - 1.0).abs() < 1e-10, "Expected +Z normal, got {:?}", n);
        }

        // Face winding should produce the same orientation as the normals
        for tri in mesh.indices.chunks_exact(3) {
            let p0 = mesh.positions[tri[0] as usize];
            let p1 = mesh.positions[tri[1] as usize];
            let p2 = mesh.positions[tri[2] as usize];
            let face_normal = (p1 - p0).cross(p2 - p0);
            assert!(face_normal.z > 0.0, "Face winding opposes vertex normals");
        }
    }

    #[test]
    fn test_naive_uvs_are_parametric() {
        let mesh = tessellate_surface_naive(&flat_patch(), 2, 2);
        // corner vertices carry the raw domain parameters
        assert!((mesh.uvs[0] - Point2::new(0.0, 0.0)).length() < 1e-12);
        let last = mesh.uvs[mesh.uvs.len() - 1];
        assert!((last - Point2::new(1.0, 1.0)).length() < 1e-12);
    }
}
