//! Curve sampling: uniform and adaptive subdivision.

use rand::Rng;
use spl_math::{three_points_are_flat, Point3};

use crate::curve::{Curve, NurbsCurve};

/// A sampled curve point together with the parameter it was taken at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSample {
    pub u: f64,
    pub point: Point3,
}

/// Maximum recursion depth for adaptive subdivision.
const MAX_DEPTH: u32 = 12;

/// Sample a curve at `num_samples` uniformly spaced parameters across its
/// domain (at least 2).
pub fn curve_regular_sample(curve: &dyn Curve, num_samples: usize) -> Vec<CurveSample> {
    let (t_min, t_max) = curve.domain();
    curve_regular_sample_range(curve, t_min, t_max, num_samples)
}

/// Sample a curve at `num_samples` uniformly spaced parameters in
/// `[start_u, end_u]`.
pub fn curve_regular_sample_range(
    curve: &dyn Curve,
    start_u: f64,
    end_u: f64,
    num_samples: usize,
) -> Vec<CurveSample> {
    let num_samples = num_samples.max(2);
    let span = (end_u - start_u) / (num_samples - 1) as f64;

    (0..num_samples)
        .map(|i| {
            let u = start_u + span * i as f64;
            CurveSample {
                u,
                point: curve.point_at(u),
            }
        })
        .collect()
}

/// Adaptively sample a NURBS curve to within `tol`.
///
/// Subdivision stops when the start, end, and a jittered interior point pass
/// the three-point flatness test. The jitter avoids systematic aliasing
/// against symmetric control polygons; pass a seeded `rng` for reproducible
/// output.
///
/// Degree-1 curves are their own polyline: the control points are returned
/// directly, each paired with its Greville parameter `knots[i + 1]`.
pub fn curve_adaptive_sample(
    curve: &NurbsCurve,
    tol: f64,
    rng: &mut impl Rng,
) -> Vec<CurveSample> {
    if curve.degree == 1 {
        return curve
            .control_points
            .iter()
            .enumerate()
            .map(|(i, &point)| CurveSample {
                u: curve.knots[i + 1],
                point,
            })
            .collect();
    }

    let (t_min, t_max) = curve.domain();
    curve_adaptive_sample_range(curve, t_min, t_max, tol, rng)
}

/// Adaptively sample a curve over `[start_u, end_u]` to within `tol`.
pub fn curve_adaptive_sample_range(
    curve: &dyn Curve,
    start_u: f64,
    end_u: f64,
    tol: f64,
    rng: &mut impl Rng,
) -> Vec<CurveSample> {
    sample_range(curve, start_u, end_u, tol, rng, 0)
}

fn sample_range(
    curve: &dyn Curve,
    start_u: f64,
    end_u: f64,
    tol: f64,
    rng: &mut impl Rng,
    depth: u32,
) -> Vec<CurveSample> {
    let p1 = curve.point_at(start_u);
    let p3 = curve.point_at(end_u);

    if depth >= MAX_DEPTH {
        return vec![
            CurveSample {
                u: start_u,
                point: p1,
            },
            CurveSample {
                u: end_u,
                point: p3,
            },
        ];
    }

    let t = 0.5 + 0.2 * rng.random::<f64>();
    let mid_u = start_u + (end_u - start_u) * t;
    let p2 = curve.point_at(mid_u);

    // If start and end coincide but the interior point does not, the segment
    // loops back on itself and the flatness test alone would accept it.
    let diff = p1 - p3;
    let diff2 = p1 - p2;
    let is_loop = diff.dot(diff) < tol && diff2.dot(diff2) > tol;

    if is_loop || !three_points_are_flat(p1, p2, p3, tol) {
        // recurse on the two halves, split at the exact midpoint
        let exact_mid_u = start_u + (end_u - start_u) * 0.5;

        let mut left = sample_range(curve, start_u, exact_mid_u, tol, rng, depth + 1);
        let right = sample_range(curve, exact_mid_u, end_u, tol, rng, depth + 1);

        // drop the midpoint duplicated between the two halves
        left.pop();
        left.extend(right);
        left
    } else {
        vec![
            CurveSample {
                u: start_u,
                point: p1,
            },
            CurveSample {
                u: end_u,
                point: p3,
            },
        ]
    }
}
