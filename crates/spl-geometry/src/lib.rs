//! SplineEngine geometry: NURBS evaluation, curves, surfaces, and sampling.

pub mod curve;
pub mod nurbs;
pub mod surface;
pub mod tessellate;

pub use curve::Curve;
pub use surface::Surface;
