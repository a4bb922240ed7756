use crate::error::Result;

/// Validate structural integrity of a geometric entity.
///
/// For spline types this checks the degree / control-point / knot-count
/// relation before any evaluation takes place.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}
