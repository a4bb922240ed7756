//! B-spline and NURBS surface implementations.

use serde::{Deserialize, Serialize};
use spl_core::{Result, SplError, Validate};
use spl_math::{DVec3, Point3, Vector3};

use super::Surface;
use crate::nurbs::knot::are_valid_relations;
use crate::nurbs::{deboor, rational};

fn normal_from_partials(du: Vector3, dv: Vector3) -> Vector3 {
    let n = du.cross(dv);
    let len = n.length();
    if len < 1e-15 {
        DVec3::Z
    } else {
        n / len
    }
}

fn validate_grid_relations(
    degree_u: usize,
    degree_v: usize,
    knots_u: &[f64],
    knots_v: &[f64],
    control_points: &[Vec<Point3>],
) -> Result<()> {
    if control_points.is_empty() || control_points[0].is_empty() {
        return Err(SplError::InvalidInput(
            "empty surface control-point grid".to_string(),
        ));
    }
    let n_v = control_points[0].len();
    if control_points.iter().any(|row| row.len() != n_v) {
        return Err(SplError::InvalidInput(
            "control-point grid rows have unequal lengths".to_string(),
        ));
    }
    if !are_valid_relations(degree_u, control_points.len(), knots_u.len()) {
        return Err(SplError::InvalidInput(format!(
            "knots_u length {} does not satisfy n + p + 1 for {} rows of degree {}",
            knots_u.len(),
            control_points.len(),
            degree_u
        )));
    }
    if !are_valid_relations(degree_v, n_v, knots_v.len()) {
        return Err(SplError::InvalidInput(format!(
            "knots_v length {} does not satisfy n + p + 1 for {} columns of degree {}",
            knots_v.len(),
            n_v,
            degree_v
        )));
    }
    Ok(())
}

/// A B-spline surface defined by degrees, knot vectors, and a 2D grid of control points.
///
/// `control_points[i][j]` is the control point at row `i` (u-direction) and column `j` (v-direction).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BSplineSurface {
    pub degree_u: usize,
    pub degree_v: usize,
    pub knots_u: Vec<f64>,
    pub knots_v: Vec<f64>,
    pub control_points: Vec<Vec<Point3>>,
}

impl BSplineSurface {
    pub fn new(
        degree_u: usize,
        degree_v: usize,
        knots_u: Vec<f64>,
        knots_v: Vec<f64>,
        control_points: Vec<Vec<Point3>>,
    ) -> Result<Self> {
        let surface = Self {
            degree_u,
            degree_v,
            knots_u,
            knots_v,
            control_points,
        };
        surface.validate()?;
        Ok(surface)
    }

    fn n(&self) -> usize {
        self.knots_u.len() - self.degree_u - 2
    }

    fn m(&self) -> usize {
        self.knots_v.len() - self.degree_v - 2
    }

    /// Evaluate mixed partials up to total order `num_derivs`.
    ///
    /// Entry `[k][l]` is the partial of order `k` in `u` and `l` in `v`;
    /// `[0][0]` is the surface point.
    pub fn derivs_at(&self, u: f64, v: f64, num_derivs: usize) -> Vec<Vec<Vector3>> {
        deboor::surface_derivs_given_n_m(
            self.n(),
            self.degree_u,
            &self.knots_u,
            self.m(),
            self.degree_v,
            &self.knots_v,
            &self.control_points,
            u,
            v,
            num_derivs,
        )
    }
}

impl Validate for BSplineSurface {
    fn validate(&self) -> Result<()> {
        validate_grid_relations(
            self.degree_u,
            self.degree_v,
            &self.knots_u,
            &self.knots_v,
            &self.control_points,
        )
    }
}

impl Surface for BSplineSurface {
    fn point_at(&self, u: f64, v: f64) -> Point3 {
        deboor::surface_point_given_n_m(
            self.n(),
            self.degree_u,
            &self.knots_u,
            self.m(),
            self.degree_v,
            &self.knots_v,
            &self.control_points,
            u,
            v,
        )
    }

    fn normal_at(&self, u: f64, v: f64) -> Vector3 {
        self.point_and_normal_at(u, v).1
    }

    fn domain_u(&self) -> (f64, f64) {
        let p = self.degree_u;
        (self.knots_u[p], self.knots_u[self.knots_u.len() - p - 1])
    }

    fn domain_v(&self) -> (f64, f64) {
        let p = self.degree_v;
        (self.knots_v[p], self.knots_v[self.knots_v.len() - p - 1])
    }

    fn point_and_normal_at(&self, u: f64, v: f64) -> (Point3, Vector3) {
        let skl = self.derivs_at(u, v, 1);
        (skl[0][0], normal_from_partials(skl[1][0], skl[0][1]))
    }
}

/// A NURBS surface (rational B-spline surface).
///
/// Extends `BSplineSurface` with a 2D grid of weights. The homogeneous form
/// is recomputed from points and weights on each evaluation, never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NurbsSurface {
    pub degree_u: usize,
    pub degree_v: usize,
    pub knots_u: Vec<f64>,
    pub knots_v: Vec<f64>,
    pub control_points: Vec<Vec<Point3>>,
    pub weights: Vec<Vec<f64>>,
}

impl NurbsSurface {
    pub fn new(
        degree_u: usize,
        degree_v: usize,
        knots_u: Vec<f64>,
        knots_v: Vec<f64>,
        control_points: Vec<Vec<Point3>>,
        weights: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let surface = Self {
            degree_u,
            degree_v,
            knots_u,
            knots_v,
            control_points,
            weights,
        };
        surface.validate()?;
        Ok(surface)
    }

    fn n(&self) -> usize {
        self.knots_u.len() - self.degree_u - 2
    }

    fn m(&self) -> usize {
        self.knots_v.len() - self.degree_v - 2
    }

    /// Evaluate mixed partials up to total order `num_derivs`.
    ///
    /// Returns a triangular table: entry `[k][l]` is present for
    /// `k + l <= num_derivs`; `[0][0]` is the surface point.
    pub fn derivs_at(&self, u: f64, v: f64, num_derivs: usize) -> Vec<Vec<Vector3>> {
        let homo = rational::homogenize_2d(&self.control_points, &self.weights);
        rational::rational_surface_derivs_given_n_m(
            self.n(),
            self.degree_u,
            &self.knots_u,
            self.m(),
            self.degree_v,
            &self.knots_v,
            &homo,
            u,
            v,
            num_derivs,
        )
    }
}

impl Validate for NurbsSurface {
    fn validate(&self) -> Result<()> {
        validate_grid_relations(
            self.degree_u,
            self.degree_v,
            &self.knots_u,
            &self.knots_v,
            &self.control_points,
        )?;
        if self.weights.len() != self.control_points.len()
            || self
                .weights
                .iter()
                .zip(&self.control_points)
                .any(|(wrow, prow)| wrow.len() != prow.len())
        {
            return Err(SplError::InvalidInput(
                "weight grid shape must match control-point grid".to_string(),
            ));
        }
        if self.weights.iter().flatten().any(|&w| w <= 0.0) {
            return Err(SplError::InvalidInput(
                "all weights must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Surface for NurbsSurface {
    fn point_at(&self, u: f64, v: f64) -> Point3 {
        let homo = rational::homogenize_2d(&self.control_points, &self.weights);
        rational::rational_surface_point_given_n_m(
            self.n(),
            self.degree_u,
            &self.knots_u,
            self.m(),
            self.degree_v,
            &self.knots_v,
            &homo,
            u,
            v,
        )
    }

    fn normal_at(&self, u: f64, v: f64) -> Vector3 {
        self.point_and_normal_at(u, v).1
    }

    fn domain_u(&self) -> (f64, f64) {
        let p = self.degree_u;
        (self.knots_u[p], self.knots_u[self.knots_u.len() - p - 1])
    }

    fn domain_v(&self) -> (f64, f64) {
        let p = self.degree_v;
        (self.knots_v[p], self.knots_v[self.knots_v.len() - p - 1])
    }

    fn point_and_normal_at(&self, u: f64, v: f64) -> (Point3, Vector3) {
        let skl = self.derivs_at(u, v, 1);
        (skl[0][0], normal_from_partials(skl[1][0], skl[0][1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bilinear_surface() -> BSplineSurface {
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
    fn test_bspline_surface_corners() {
        let surf = bilinear_surface();
        assert!((surf.point_at(0.0, 0.0) - DVec3::new(0.0, 0.0, 0.0)).length() < 1e-10);
        assert!((surf.point_at(1.0, 0.0) - DVec3::new(1.0, 0.0, 0.0)).length() < 1e-10);
        assert!((surf.point_at(0.0, 1.0) - DVec3::new(0.0, 1.0, 0.0)).length() < 1e-10);
        assert!((surf.point_at(1.0, 1.0) - DVec3::new(1.0, 1.0, 0.0)).length() < 1e-10);
    }

    #[test]
    fn test_bspline_surface_center() {
        let surf = bilinear_surface();
        let p = surf.point_at(0.5, 0.5);
        assert!((p - DVec3::new(0.5, 0.5, 0.0)).length() < 1e-10);
    }

    #[test]
    fn test_bspline_surface_normal_flat() {
        let surf = bilinear_surface();
        let n = surf.normal_at(0.5, 0.5);
        // u runs along x and v along y, so du x dv points in +Z
        assert!(
            (n - DVec3::Z).length() < 1e-10,
            "Normal of flat surface should be +Z, got {:?}",
            n
        );
    }

    #[test]
    fn test_point_and_normal_matches_separate_calls() {
        let surf = bilinear_surface();
        let (p, n) = surf.point_and_normal_at(0.3, 0.8);
        assert!((p - surf.point_at(0.3, 0.8)).length() < 1e-12);
        assert!((n - surf.normal_at(0.3, 0.8)).length() < 1e-12);
    }

    #[test]
    fn test_bspline_surface_rejects_ragged_grid() {
        let result = BSplineSurface::new(
            1,
            1,
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0],
            vec![
                vec![DVec3::ZERO, DVec3::Y],
                vec![DVec3::X],
            ],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_bspline_surface_rejects_bad_knot_count() {
        let result = BSplineSurface::new(
            1,
            1,
            vec![0.0, 0.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0],
            vec![
                vec![DVec3::ZERO, DVec3::Y],
                vec![DVec3::X, DVec3::ONE],
            ],
        );
        assert!(matches!(result, Err(SplError::InvalidInput(_))));
    }

    #[test]
    fn test_nurbs_surface_uniform_weights_matches_bspline() {
        let bspline = bilinear_surface();
        let nurbs = NurbsSurface::new(
            1,
            1,
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0],
            bspline.control_points.clone(),
            vec![vec![1.0, 1.0], vec![1.0, 1.0]],
        )
        .unwrap();

        for i in 0..=4 {
            for j in 0..=4 {
                let (u, v) = (i as f64 / 4.0, j as f64 / 4.0);
                assert!((bspline.point_at(u, v) - nurbs.point_at(u, v)).length() < 1e-12);
            }
        }
    }

    #[test]
    fn test_nurbs_surface_derivs_first_partials() {
        let nurbs = NurbsSurface::new(
            1,
            1,
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0],
            vec![
                vec![DVec3::new(0.0, 0.0, 0.0), DVec3::new(0.0, 2.0, 0.0)],
                vec![DVec3::new(3.0, 0.0, 0.0), DVec3::new(3.0, 2.0, 0.0)],
            ],
            vec![vec![1.0, 1.0], vec![1.0, 1.0]],
        )
        .unwrap();

        let skl = nurbs.derivs_at(0.5, 0.5, 1);
        assert!((skl[1][0] - DVec3::new(3.0, 0.0, 0.0)).length() < 1e-10);
        assert!((skl[0][1] - DVec3::new(0.0, 2.0, 0.0)).length() < 1e-10);
    }

    #[test]
    fn test_nurbs_surface_rejects_negative_weight() {
        let result = NurbsSurface::new(
            1,
            1,
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0],
            vec![
                vec![DVec3::ZERO, DVec3::Y],
                vec![DVec3::X, DVec3::ONE],
            ],
            vec![vec![1.0, 1.0], vec![-1.0, 1.0]],
        );
        assert!(result.is_err());
    }
}
