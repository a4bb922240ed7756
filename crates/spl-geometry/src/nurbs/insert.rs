//! Curve knot insertion (The NURBS Book, algorithm A5.1).
//!
//! Inserting a knot `r` times refines the control polygon without changing
//! the curve. For rational curves, run this on homogeneous control points.

use spl_core::{Result, SplError};

use super::deboor::ControlPoint;
use super::knot::{are_valid_relations, find_span};

/// Insert the knot `t` into the curve `r` times.
///
/// Returns the refined `(knots, control_points)` pair describing the same
/// curve. The combined multiplicity of `t` after insertion must not exceed
/// the degree.
pub fn curve_knot_insert<P: ControlPoint>(
    degree: usize,
    knots: &[f64],
    control_points: &[P],
    t: f64,
    r: usize,
) -> Result<(Vec<f64>, Vec<P>)> {
    if !are_valid_relations(degree, control_points.len(), knots.len()) {
        return Err(SplError::InvalidInput(format!(
            "degree {}, {} control points, and {} knots violate n + p + 1 = m",
            degree,
            control_points.len(),
            knots.len()
        )));
    }

    let p = degree;
    let np = control_points.len() - 1;
    let k = find_span(p, knots, np, t);
    let s = knots.iter().filter(|&&kv| kv == t).count();

    if r == 0 {
        return Ok((knots.to_vec(), control_points.to_vec()));
    }
    if s + r > p {
        return Err(SplError::InvalidOperation(format!(
            "inserting t={} {} more times would exceed multiplicity {} for degree {}",
            t,
            r,
            p + 1,
            p
        )));
    }

    let mp = np + p + 1;

    // New knot vector: copy up to the span, repeat t, copy the rest
    let mut knots_post = vec![0.0; knots.len() + r];
    knots_post[..=k].copy_from_slice(&knots[..=k]);
    for i in 1..=r {
        knots_post[k + i] = t;
    }
    for i in k + 1..=mp {
        knots_post[i + r] = knots[i];
    }

    // Control points unaffected by the insertion
    let mut cps_post = vec![P::default(); np + 1 + r];
    cps_post[..=k - p].copy_from_slice(&control_points[..=k - p]);
    for i in k - s..=np {
        cps_post[i + r] = control_points[i];
    }

    // Working points for the affected window
    let mut rw = vec![P::default(); p - s + 1];
    for (i, slot) in rw.iter_mut().enumerate() {
        *slot = control_points[k - p + i];
    }

    // Insert the knot r times
    for j in 1..=r {
        let l = k - p + j;

        for i in 0..=p - j - s {
            let alpha = (t - knots[l + i]) / (knots[i + k + 1] - knots[l + i]);
            rw[i] = rw[i + 1] * alpha + rw[i] * (1.0 - alpha);
        }

        cps_post[l] = rw[0];
        cps_post[k + r - j - s] = rw[p - j - s];
    }

    // Remaining interior points from the working window
    let l = k - p + r;
    for i in l + 1..k - s {
        cps_post[i] = rw[i - l];
    }

    Ok((knots_post, cps_post))
}

#[cfg(test)]
mod tests {
    use super::super::deboor::curve_point;
    use super::*;
    use spl_math::DVec3;

    fn cubic_curve() -> (usize, Vec<f64>, Vec<DVec3>) {
        (
            3,
            vec![0.0, 0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0, 1.0],
            vec![
                DVec3::new(0.0, 0.0, 0.0),
                DVec3::new(1.0, 2.0, 0.0),
                DVec3::new(2.0, 2.0, 1.0),
                DVec3::new(3.0, 0.0, 1.0),
                DVec3::new(4.0, 1.0, 0.0),
            ],
        )
    }

    #[test]
    fn test_insert_preserves_curve_shape() {
        let (degree, knots, cps) = cubic_curve();
        let (new_knots, new_cps) = curve_knot_insert(degree, &knots, &cps, 0.3, 1).unwrap();

        assert_eq!(new_knots.len(), knots.len() + 1);
        assert_eq!(new_cps.len(), cps.len() + 1);

        for i in 0..=20 {
            let t = i as f64 / 20.0;
            let before = curve_point(degree, &knots, &cps, t).unwrap();
            let after = curve_point(degree, &new_knots, &new_cps, t).unwrap();
            assert!(
                (before - after).length() < 1e-10,
                "Curve changed at t={}: {:?} vs {:?}",
                t,
                before,
                after
            );
        }
    }

    #[test]
    fn test_insert_multiple_times() {
        let (degree, knots, cps) = cubic_curve();
        let (new_knots, new_cps) = curve_knot_insert(degree, &knots, &cps, 0.25, 2).unwrap();

        assert_eq!(new_knots.iter().filter(|&&k| k == 0.25).count(), 2);

        for i in 0..=10 {
            let t = i as f64 / 10.0;
            let before = curve_point(degree, &knots, &cps, t).unwrap();
            let after = curve_point(degree, &new_knots, &new_cps, t).unwrap();
            assert!((before - after).length() < 1e-10);
        }
    }

    #[test]
    fn test_insert_at_existing_knot() {
        let (degree, knots, cps) = cubic_curve();
        let (new_knots, new_cps) = curve_knot_insert(degree, &knots, &cps, 0.5, 1).unwrap();

        assert_eq!(new_knots.iter().filter(|&&k| k == 0.5).count(), 2);

        for i in 0..=10 {
            let t = i as f64 / 10.0;
            let before = curve_point(degree, &knots, &cps, t).unwrap();
            let after = curve_point(degree, &new_knots, &new_cps, t).unwrap();
            assert!((before - after).length() < 1e-10);
        }
    }

    #[test]
    fn test_insert_beyond_multiplicity_fails() {
        let (degree, knots, cps) = cubic_curve();
        // 0.5 already has multiplicity 1; 3 more insertions would exceed degree 3
        assert!(curve_knot_insert(degree, &knots, &cps, 0.5, 3).is_err());
    }

    #[test]
    fn test_insert_zero_times_is_identity() {
        let (degree, knots, cps) = cubic_curve();
        let (new_knots, new_cps) = curve_knot_insert(degree, &knots, &cps, 0.3, 0).unwrap();
        assert_eq!(new_knots, knots);
        assert_eq!(new_cps, cps);
    }
}
