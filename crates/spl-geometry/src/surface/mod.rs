//! Surface traits and implementations.

mod bspline;

use spl_math::{Point3, Vector3};

pub use bspline::{BSplineSurface, NurbsSurface};

/// Trait for parametric surfaces in 3D space.
pub trait Surface: Send + Sync {
    /// Evaluate the surface at parameters `(u, v)`.
    fn point_at(&self, u: f64, v: f64) -> Point3;

    /// Evaluate the unit surface normal at parameters `(u, v)`.
    fn normal_at(&self, u: f64, v: f64) -> Vector3;

    /// Return the u-parameter domain `(u_min, u_max)`.
    fn domain_u(&self) -> (f64, f64);

    /// Return the v-parameter domain `(v_min, v_max)`.
    fn domain_v(&self) -> (f64, f64);

    /// Evaluate position and normal together.
    ///
    /// Implementations backed by derivative evaluation override this to share
    /// a single derivative pass between the two results.
    fn point_and_normal_at(&self, u: f64, v: f64) -> (Point3, Vector3) {
        (self.point_at(u, v), self.normal_at(u, v))
    }
}
