//! B-spline and NURBS curve implementations.

use serde::{Deserialize, Serialize};
use spl_core::{Result, SplError, Tolerance, Validate};
use spl_math::{Point3, Vector3};

use super::Curve;
use crate::nurbs::knot::are_valid_relations;
use crate::nurbs::{deboor, rational};

/// A B-spline curve defined by degree, knot vector, and control points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BSplineCurve {
    pub degree: usize,
    pub knots: Vec<f64>,
    pub control_points: Vec<Point3>,
}

impl BSplineCurve {
    pub fn new(degree: usize, knots: Vec<f64>, control_points: Vec<Point3>) -> Result<Self> {
        let curve = Self {
            degree,
            knots,
            control_points,
        };
        curve.validate()?;
        Ok(curve)
    }

    /// Number of basis functions minus 1.
    fn n(&self) -> usize {
        self.knots.len() - self.degree - 2
    }

    /// Evaluate derivatives up to order `num_derivs`; index 0 is the point.
    pub fn derivs_at(&self, t: f64, num_derivs: usize) -> Vec<Vector3> {
        deboor::curve_derivs_given_n(
            self.n(),
            self.degree,
            &self.knots,
            &self.control_points,
            t,
            num_derivs,
        )
    }
}

impl Validate for BSplineCurve {
    fn validate(&self) -> Result<()> {
        if !are_valid_relations(self.degree, self.control_points.len(), self.knots.len()) {
            return Err(SplError::InvalidInput(format!(
                "knot vector length must be n + p + 1, got {} knots for {} control points of degree {}",
                self.knots.len(),
                self.control_points.len(),
                self.degree
            )));
        }
        if self.knots.windows(2).any(|w| w[0] > w[1]) {
            return Err(SplError::InvalidInput(
                "knot vector must be non-decreasing".to_string(),
            ));
        }
        Ok(())
    }
}

impl Curve for BSplineCurve {
    fn point_at(&self, t: f64) -> Point3 {
        deboor::curve_point_given_n(self.n(), self.degree, &self.knots, &self.control_points, t)
    }

    fn tangent_at(&self, t: f64) -> Vector3 {
        self.derivs_at(t, 1)[1]
    }

    fn domain(&self) -> (f64, f64) {
        let p = self.degree;
        (self.knots[p], self.knots[self.knots.len() - p - 1])
    }

    fn is_closed(&self) -> bool {
        let (t0, t1) = self.domain();
        let gap = (self.point_at(t0) - self.point_at(t1)).length();
        Tolerance::default_precision().is_zero(gap)
    }
}

/// A NURBS (Non-Uniform Rational B-Spline) curve.
///
/// Extends `BSplineCurve` with weights for rational evaluation. The
/// homogeneous form is recomputed from points and weights on each evaluation,
/// never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NurbsCurve {
    pub degree: usize,
    pub knots: Vec<f64>,
    pub control_points: Vec<Point3>,
    pub weights: Vec<f64>,
}

impl NurbsCurve {
    pub fn new(
        degree: usize,
        knots: Vec<f64>,
        control_points: Vec<Point3>,
        weights: Vec<f64>,
    ) -> Result<Self> {
        let curve = Self {
            degree,
            knots,
            control_points,
            weights,
        };
        curve.validate()?;
        Ok(curve)
    }

    fn n(&self) -> usize {
        self.knots.len() - self.degree - 2
    }

    /// Evaluate derivatives up to order `num_derivs`; index 0 is the point.
    pub fn derivs_at(&self, t: f64, num_derivs: usize) -> Vec<Vector3> {
        let homo = rational::homogenize_1d(&self.control_points, &self.weights);
        rational::rational_curve_derivs_given_n(
            self.n(),
            self.degree,
            &self.knots,
            &homo,
            t,
            num_derivs,
        )
    }
}

impl Validate for NurbsCurve {
    fn validate(&self) -> Result<()> {
        if !are_valid_relations(self.degree, self.control_points.len(), self.knots.len()) {
            return Err(SplError::InvalidInput(format!(
                "knot vector length must be n + p + 1, got {} knots for {} control points of degree {}",
                self.knots.len(),
                self.control_points.len(),
                self.degree
            )));
        }
        if self.weights.len() != self.control_points.len() {
            return Err(SplError::InvalidInput(format!(
                "{} weights for {} control points",
                self.weights.len(),
                self.control_points.len()
            )));
        }
        if self.weights.iter().any(|&w| w <= 0.0) {
            return Err(SplError::InvalidInput(
                "all weights must be positive".to_string(),
            ));
        }
        if self.knots.windows(2).any(|w| w[0] > w[1]) {
            return Err(SplError::InvalidInput(
                "knot vector must be non-decreasing".to_string(),
            ));
        }
        Ok(())
    }
}

impl Curve for NurbsCurve {
    fn point_at(&self, t: f64) -> Point3 {
        let homo = rational::homogenize_1d(&self.control_points, &self.weights);
        rational::rational_curve_point_given_n(self.n(), self.degree, &self.knots, &homo, t)
    }

    fn tangent_at(&self, t: f64) -> Vector3 {
        self.derivs_at(t, 1)[1]
    }

    fn domain(&self) -> (f64, f64) {
        let p = self.degree;
        (self.knots[p], self.knots[self.knots.len() - p - 1])
    }

    fn is_closed(&self) -> bool {
        let (t0, t1) = self.domain();
        let gap = (self.point_at(t0) - self.point_at(t1)).length();
        Tolerance::default_precision().is_zero(gap)
    }
}
