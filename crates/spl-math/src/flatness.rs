//! Colinearity predicate used as the subdivision-stopping criterion.

use crate::Point3;

/// Determine whether three points are colinear within `tol`.
///
/// ```text
///          * p2
///         / \
///        /   \
///       /     \
///      /       \
///     * p1 ---- * p3
/// ```
///
/// The metric is the squared norm of the cross product of the two edge
/// vectors (proportional to the squared triangle area), so no square root or
/// division is needed.
pub fn three_points_are_flat(p1: Point3, p2: Point3, p3: Point3, tol: f64) -> bool {
    let norm = (p2 - p1).cross(p3 - p1);
    norm.dot(norm) < tol
}
