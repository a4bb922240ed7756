//! Curvature-bounded step sizing for uniform tessellation.
//!
//! Follows Piegl & Richard, "Tessellating Trimmed NURBS Surfaces" (1995):
//! bound the second derivatives of the surface by finite differences of the
//! homogeneous control points, then pick a step size whose linear
//! interpolation error stays below the requested deviation (equation 22).
//! The bound is a single pass over the control grid, deliberately
//! conservative, with no iteration.

use spl_core::{Result, SplError};
use spl_geometry::nurbs::homogenize_2d;
use spl_geometry::surface::NurbsSurface;
use spl_geometry::Surface;
use spl_math::HPoint;

use crate::naive::tessellate_surface_naive;
use crate::TriangleMesh;

/// Upper bounds on the second-derivative surfaces, obtained from the control
/// points of the formally differentiated surfaces: pure-u, pure-v, and mixed.
fn second_deriv_bounds(
    degree_u: usize,
    degree_v: usize,
    knots_u: &[f64],
    knots_v: &[f64],
    pts: &[Vec<HPoint>],
) -> (f64, f64, f64) {
    let n = pts.len();
    let m = pts[0].len();
    let p = degree_u;
    let q = degree_v;
    let u = knots_u;
    let v = knots_v;

    // S_uu control points
    let pp1 = (p * (p - 1)) as f64;
    let mut max_uu = 0.0f64;
    for i in 0..n - 2 {
        for j in 0..m {
            let d1 = (pts[i + 2][j] - pts[i + 1][j]) * (1.0 / (u[i + p + 2] - u[i + 2]));
            let d2 = (pts[i + 1][j] - pts[i][j]) * (1.0 / (u[i + p + 1] - u[i + 1]));
            let bound = ((d1 - d2) * (pp1 / (u[i + p + 1] - u[i + 2]))).length();
            max_uu = max_uu.max(bound);
        }
    }

    // S_vv control points
    let qq1 = (q * (q - 1)) as f64;
    let mut max_vv = 0.0f64;
    for row in pts {
        for j in 0..m - 2 {
            let d1 = (row[j + 2] - row[j + 1]) * (1.0 / (v[j + q + 2] - v[j + 2]));
            let d2 = (row[j + 1] - row[j]) * (1.0 / (v[j + q + 1] - v[j + 1]));
            let bound = ((d1 - d2) * (qq1 / (v[j + q + 1] - v[j + 2]))).length();
            max_vv = max_vv.max(bound);
        }
    }

    // S_uv control points
    let pq = (p * q) as f64;
    let mut max_uv = 0.0f64;
    for i in 0..n - 1 {
        for j in 0..m - 1 {
            let d = pts[i + 1][j + 1] - pts[i][j + 1] - pts[i + 1][j] + pts[i][j];
            let scaled = d * (1.0 / (u[i + p + 1] - u[i + 1]));
            let bound = (scaled * (pq / (v[j + q + 1] - v[j + 1]))).length();
            max_uv = max_uv.max(bound);
        }
    }

    (max_uu, max_vv, max_uv)
}

/// Estimate the uniform parameter step that keeps the chordal deviation of a
/// tessellation below `tol`.
///
/// The surface must be degree >= 3 in both directions. Degenerate geometry
/// (zero weights, coincident control points collapsing a knot span) surfaces
/// as a non-positive or NaN step and is reported as an error rather than a
/// zero division count. A genuinely flat surface has unbounded step size;
/// `f64::INFINITY` is a valid return.
pub fn max_edge_length(surface: &NurbsSurface, tol: f64) -> Result<f64> {
    if surface.degree_u < 3 || surface.degree_v < 3 {
        return Err(SplError::InvalidInput(format!(
            "step estimation requires degree >= 3 in both directions, got {}x{}",
            surface.degree_u, surface.degree_v
        )));
    }

    let homo = homogenize_2d(&surface.control_points, &surface.weights);

    let max_len = homo
        .iter()
        .flatten()
        .map(|hp| hp.length())
        .fold(0.0f64, f64::max);
    let denom = 1.0 + max_len;

    let eps_w = surface
        .weights
        .iter()
        .flatten()
        .map(|&w| w * tol / denom)
        .fold(f64::MAX, f64::min);

    let (b_uu, b_vv, b_uv) = second_deriv_bounds(
        surface.degree_u,
        surface.degree_v,
        &surface.knots_u,
        &surface.knots_v,
        &homo,
    );

    let h = std::f64::consts::FRAC_1_SQRT_2
        * 3.0
        * (eps_w / (2.0 * (b_uu + b_vv + 2.0 * b_uv))).sqrt();

    if h.is_nan() || h <= 0.0 {
        return Err(SplError::DegenerateGeometry(format!(
            "step size {} from bounds ({}, {}, {})",
            h, b_uu, b_vv, b_uv
        )));
    }

    Ok(h)
}

/// Tessellate a surface of degree >= 3 on a uniform grid sized so the mesh
/// deviates from the surface by at most `tol`.
pub fn tessellate_surface_uniform_cubic(surface: &NurbsSurface, tol: f64) -> Result<TriangleMesh> {
    let h = max_edge_length(surface, tol)?;

    let (u_min, u_max) = surface.domain_u();
    let (v_min, v_max) = surface.domain_v();

    let divs_u = ((u_max - u_min) / h + 1.0) as usize;
    let divs_v = ((v_max - v_min) / h + 1.0) as usize;

    Ok(tessellate_surface_naive(surface, divs_u, divs_v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use spl_math::DVec3;

    fn clamped_cubic_knots(num_cps: usize) -> Vec<f64> {
        let interior = num_cps - 4;
        let mut knots = vec![0.0; 4];
        for i in 0..interior {
            knots.push((i + 1) as f64 / (interior + 1) as f64);
        }
        knots.extend_from_slice(&[1.0; 4]);
        knots
    }

    /// Degree-3 patch with a bump in the middle.
    fn bumpy_surface() -> NurbsSurface {
        let cps: Vec<Vec<DVec3>> = (0..5)
            .map(|i| {
                (0..5)
                    .map(|j| {
                        let z = if i == 2 && j == 2 { 2.0 } else { 0.0 };
                        DVec3::new(i as f64, j as f64, z)
                    })
                    .collect()
            })
            .collect();
        NurbsSurface::new(
            3,
            3,
            clamped_cubic_knots(5),
            clamped_cubic_knots(5),
            cps,
            vec![vec![1.0; 5]; 5],
        )
        .unwrap()
    }

    #[test]
    fn test_max_edge_length_is_positive_and_finite() {
        let h = max_edge_length(&bumpy_surface(), 1e-3).unwrap();
        assert!(h.is_finite());
        assert!(h > 0.0);
    }

    #[test]
    fn test_max_edge_length_shrinks_with_tolerance() {
        let surface = bumpy_surface();
        let loose = max_edge_length(&surface, 1e-2).unwrap();
        let tight = max_edge_length(&surface, 1e-4).unwrap();
        assert!(
            tight < loose,
            "Tighter tolerance must give a smaller step: {} vs {}",
            tight,
            loose
        );
    }

    #[test]
    fn test_max_edge_length_rejects_low_degree() {
        let surface = NurbsSurface::new(
            1,
            1,
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0],
            vec![
                vec![DVec3::ZERO, DVec3::Y],
                vec![DVec3::X, DVec3::ONE],
            ],
            vec![vec![1.0, 1.0], vec![1.0, 1.0]],
        )
        .unwrap();
        assert!(matches!(
            max_edge_length(&surface, 1e-3),
            Err(SplError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_flat_cubic_surface_has_unbounded_step() {
        // all second-derivative bounds vanish on a plane
        let cps: Vec<Vec<DVec3>> = (0..4)
            .map(|i| (0..4).map(|j| DVec3::new(i as f64, j as f64, 0.0)).collect())
            .collect();
        let surface = NurbsSurface::new(
            3,
            3,
            clamped_cubic_knots(4),
            clamped_cubic_knots(4),
            cps,
            vec![vec![1.0; 4]; 4],
        )
        .unwrap();

        let h = max_edge_length(&surface, 1e-3).unwrap();
        assert!(h.is_infinite());
    }

    #[test]
    fn test_uniform_cubic_mesh_within_tolerance() {
        let surface = bumpy_surface();
        let tol = 1e-2;
        let mesh = tessellate_surface_uniform_cubic(&surface, tol).unwrap();
        assert!(mesh.triangle_count() >= 2);

        // every vertex lies on the surface at its recorded parameters
        for (p, uv) in mesh.positions.iter().zip(&mesh.uvs) {
            let q = surface.point_at(uv.x, uv.y);
            assert!((*p - q).length() < 1e-10);
        }
    }

    #[test]
    fn test_uniform_cubic_flat_surface_single_cell() {
        let cps: Vec<Vec<DVec3>> = (0..4)
            .map(|i| (0..4).map(|j| DVec3::new(i as f64, j as f64, 0.0)).collect())
            .collect();
        let surface = NurbsSurface::new(
            3,
            3,
            clamped_cubic_knots(4),
            clamped_cubic_knots(4),
            cps,
            vec![vec![1.0; 4]; 4],
        )
        .unwrap();

        // infinite step collapses to the minimum 1x1 grid
        let mesh = tessellate_surface_uniform_cubic(&surface, 1e-3).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
    }
}
