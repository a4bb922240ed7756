pub mod binomial;
pub mod flatness;

pub use glam::{DVec2, DVec3, DVec4};

pub use binomial::binomial;
pub use flatness::three_points_are_flat;

pub type Point2 = DVec2;
pub type Point3 = DVec3;
pub type Vector2 = DVec2;
pub type Vector3 = DVec3;

/// Homogeneous point `(w*x, w*y, w*z, w)` used for rational evaluation.
pub type HPoint = DVec4;
