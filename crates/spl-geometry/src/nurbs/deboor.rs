//! Non-rational B-spline evaluation for curves and tensor-product surfaces.
//!
//! The algorithms are generic over the control-point type so the same code
//! evaluates Euclidean (`Point3`) and homogeneous (`HPoint`) control points;
//! rational evaluation reuses these paths on homogeneous data.

use std::ops::{Add, Mul, Sub};

use spl_core::{Result, SplError};

use super::knot::{are_valid_relations, basis_function_derivs, basis_functions, find_span};

/// Anything that behaves like a fixed-dimension point under linear
/// combination. Implemented by `glam`'s `DVec3` and `DVec4`.
pub trait ControlPoint:
    Copy + Default + Add<Output = Self> + Sub<Output = Self> + Mul<f64, Output = Self>
{
}

impl<T> ControlPoint for T where
    T: Copy + Default + Add<Output = Self> + Sub<Output = Self> + Mul<f64, Output = Self>
{
}

fn check_curve_relations(degree: usize, num_control_points: usize, knot_count: usize) -> Result<()> {
    if !are_valid_relations(degree, num_control_points, knot_count) {
        return Err(SplError::InvalidInput(format!(
            "degree {}, {} control points, and {} knots violate n + p + 1 = m",
            degree, num_control_points, knot_count
        )));
    }
    Ok(())
}

/// Evaluate a B-spline curve point at parameter `t`.
///
/// Validates the degree/control-point/knot relation before evaluating.
pub fn curve_point<P: ControlPoint>(
    degree: usize,
    knots: &[f64],
    control_points: &[P],
    t: f64,
) -> Result<P> {
    check_curve_relations(degree, control_points.len(), knots.len())?;
    let n = knots.len() - degree - 2;
    Ok(curve_point_given_n(n, degree, knots, control_points, t))
}

/// Evaluate a B-spline curve point at parameter `t`, with `n` the number of
/// basis functions minus 1.
///
/// The caller must have verified `n + degree + 2 == knots.len()` and
/// `control_points.len() == n + 1`.
pub fn curve_point_given_n<P: ControlPoint>(
    n: usize,
    degree: usize,
    knots: &[f64],
    control_points: &[P],
    t: f64,
) -> P {
    let span = find_span(degree, knots, n, t);
    let basis = basis_functions(degree, knots, span, t);

    let mut point = P::default();
    for (i, &b) in basis.iter().enumerate() {
        point = point + control_points[span - degree + i] * b;
    }

    point
}

/// Evaluate the derivatives of a B-spline curve at parameter `t`.
///
/// Returns `num_derivs + 1` vectors; index 0 is the curve point and index `k`
/// the `k`-th derivative. Orders above the degree are zero vectors.
pub fn curve_derivs<P: ControlPoint>(
    degree: usize,
    knots: &[f64],
    control_points: &[P],
    t: f64,
    num_derivs: usize,
) -> Result<Vec<P>> {
    check_curve_relations(degree, control_points.len(), knots.len())?;
    let n = knots.len() - degree - 2;
    Ok(curve_derivs_given_n(
        n,
        degree,
        knots,
        control_points,
        t,
        num_derivs,
    ))
}

/// Unchecked counterpart of [`curve_derivs`].
pub fn curve_derivs_given_n<P: ControlPoint>(
    n: usize,
    degree: usize,
    knots: &[f64],
    control_points: &[P],
    t: f64,
    num_derivs: usize,
) -> Vec<P> {
    let du = num_derivs.min(degree);
    let span = find_span(degree, knots, n, t);
    let nders = basis_function_derivs(degree, knots, span, t, du);

    let mut ck = vec![P::default(); num_derivs + 1];
    for (k, row) in nders.iter().enumerate().take(du + 1) {
        for (j, &d) in row.iter().enumerate() {
            ck[k] = ck[k] + control_points[span - degree + j] * d;
        }
    }

    ck
}

fn check_surface_relations<P>(
    degree_u: usize,
    degree_v: usize,
    knots_u: &[f64],
    knots_v: &[f64],
    control_points: &[Vec<P>],
) -> Result<()> {
    if control_points.is_empty() || control_points[0].is_empty() {
        return Err(SplError::InvalidInput(
            "empty surface control-point grid".to_string(),
        ));
    }
    check_curve_relations(degree_u, control_points.len(), knots_u.len())?;
    check_curve_relations(degree_v, control_points[0].len(), knots_v.len())?;
    Ok(())
}

/// Evaluate a B-spline surface point at parameters `(u, v)`.
pub fn surface_point<P: ControlPoint>(
    degree_u: usize,
    degree_v: usize,
    knots_u: &[f64],
    knots_v: &[f64],
    control_points: &[Vec<P>],
    u: f64,
    v: f64,
) -> Result<P> {
    check_surface_relations(degree_u, degree_v, knots_u, knots_v, control_points)?;
    let n = knots_u.len() - degree_u - 2;
    let m = knots_v.len() - degree_v - 2;
    Ok(surface_point_given_n_m(
        n,
        degree_u,
        knots_u,
        m,
        degree_v,
        knots_v,
        control_points,
        u,
        v,
    ))
}

/// Unchecked counterpart of [`surface_point`]; `n` and `m` are the numbers of
/// basis functions minus 1 in each direction.
#[allow(clippy::too_many_arguments)]
pub fn surface_point_given_n_m<P: ControlPoint>(
    n: usize,
    degree_u: usize,
    knots_u: &[f64],
    m: usize,
    degree_v: usize,
    knots_v: &[f64],
    control_points: &[Vec<P>],
    u: f64,
    v: f64,
) -> P {
    let span_u = find_span(degree_u, knots_u, n, u);
    let basis_u = basis_functions(degree_u, knots_u, span_u, u);

    let span_v = find_span(degree_v, knots_v, m, v);
    let basis_v = basis_functions(degree_v, knots_v, span_v, v);

    let mut point = P::default();
    for (i, &bu) in basis_u.iter().enumerate() {
        let u_idx = span_u - degree_u + i;
        for (j, &bv) in basis_v.iter().enumerate() {
            let v_idx = span_v - degree_v + j;
            point = point + control_points[u_idx][v_idx] * (bu * bv);
        }
    }

    point
}

/// Evaluate the partial derivatives of a B-spline surface at `(u, v)`.
///
/// Returns a `(num_derivs + 1) x (num_derivs + 1)` table where entry `[k][l]`
/// is the mixed partial of order `k` in `u` and `l` in `v`; entry `[0][0]` is
/// the surface point. Orders above the respective degree are zero vectors.
pub fn surface_derivs<P: ControlPoint>(
    degree_u: usize,
    degree_v: usize,
    knots_u: &[f64],
    knots_v: &[f64],
    control_points: &[Vec<P>],
    t_u: f64,
    t_v: f64,
    num_derivs: usize,
) -> Result<Vec<Vec<P>>> {
    check_surface_relations(degree_u, degree_v, knots_u, knots_v, control_points)?;
    let n = knots_u.len() - degree_u - 2;
    let m = knots_v.len() - degree_v - 2;
    Ok(surface_derivs_given_n_m(
        n,
        degree_u,
        knots_u,
        m,
        degree_v,
        knots_v,
        control_points,
        t_u,
        t_v,
        num_derivs,
    ))
}

/// Unchecked counterpart of [`surface_derivs`].
#[allow(clippy::too_many_arguments)]
pub fn surface_derivs_given_n_m<P: ControlPoint>(
    n: usize,
    degree_u: usize,
    knots_u: &[f64],
    m: usize,
    degree_v: usize,
    knots_v: &[f64],
    control_points: &[Vec<P>],
    u: f64,
    v: f64,
    num_derivs: usize,
) -> Vec<Vec<P>> {
    let du = num_derivs.min(degree_u);
    let dv = num_derivs.min(degree_v);

    let span_u = find_span(degree_u, knots_u, n, u);
    let span_v = find_span(degree_v, knots_v, m, v);
    let uders = basis_function_derivs(degree_u, knots_u, span_u, u, du);
    let vders = basis_function_derivs(degree_v, knots_v, span_v, v, dv);

    let mut skl = vec![vec![P::default(); num_derivs + 1]; num_derivs + 1];
    let mut temp = vec![P::default(); degree_v + 1];

    for k in 0..=du {
        for (s, slot) in temp.iter_mut().enumerate() {
            *slot = P::default();
            for r in 0..=degree_u {
                *slot = *slot
                    + control_points[span_u - degree_u + r][span_v - degree_v + s] * uders[k][r];
            }
        }

        let dd = (num_derivs - k).min(dv);
        for l in 0..=dd {
            for (s, &tv) in temp.iter().enumerate() {
                skl[k][l] = skl[k][l] + tv * vders[l][s];
            }
        }
    }

    skl
}

#[cfg(test)]
mod tests {
    use super::*;
    use spl_math::DVec3;

    #[test]
    fn test_curve_point_linear() {
        let degree = 1;
        let knots = vec![0.0, 0.0, 1.0, 2.0, 2.0];
        let cps = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
        ];

        let p = curve_point(degree, &knots, &cps, 0.5).unwrap();
        assert!((p.x - 0.5).abs() < 1e-10);
        assert!(p.y.abs() < 1e-10);

        let p = curve_point(degree, &knots, &cps, 1.5).unwrap();
        assert!((p.x - 1.0).abs() < 1e-10);
        assert!((p.y - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_curve_point_quadratic() {
        let degree = 2;
        let knots = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let cps = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(0.5, 1.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
        ];

        let p = curve_point(degree, &knots, &cps, 0.0).unwrap();
        assert!((p.x - 0.0).abs() < 1e-10);

        let p = curve_point(degree, &knots, &cps, 1.0).unwrap();
        assert!((p.x - 1.0).abs() < 1e-10);

        // At t=0.5: 0.25*P0 + 0.5*P1 + 0.25*P2 = (0.5, 0.5, 0)
        let p = curve_point(degree, &knots, &cps, 0.5).unwrap();
        assert!((p.x - 0.5).abs() < 1e-10);
        assert!((p.y - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_curve_point_rejects_bad_relations() {
        let knots = vec![0.0, 0.0, 1.0, 1.0];
        let cps = vec![DVec3::ZERO; 5];
        assert!(curve_point(1, &knots, &cps, 0.5).is_err());
    }

    #[test]
    fn test_curve_derivs_line_tangent() {
        // derivative of a straight line is the chord per unit parameter
        let degree = 1;
        let knots = vec![0.0, 0.0, 1.0, 1.0];
        let cps = vec![DVec3::new(0.0, 0.0, 0.0), DVec3::new(2.0, 0.0, 0.0)];

        let ders = curve_derivs(degree, &knots, &cps, 0.5, 1).unwrap();
        assert!((ders[0].x - 1.0).abs() < 1e-10);
        assert!((ders[1].x - 2.0).abs() < 1e-10);
        assert!(ders[1].y.abs() < 1e-10);
    }

    #[test]
    fn test_curve_derivs_orders_above_degree_are_zero() {
        let degree = 2;
        let knots = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let cps = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(0.5, 1.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
        ];

        let ders = curve_derivs(degree, &knots, &cps, 0.5, 4).unwrap();
        assert_eq!(ders.len(), 5);
        assert_eq!(ders[3], DVec3::ZERO);
        assert_eq!(ders[4], DVec3::ZERO);
    }

    fn bilinear_cps() -> Vec<Vec<DVec3>> {
        vec![
            vec![DVec3::new(0.0, 0.0, 0.0), DVec3::new(0.0, 1.0, 0.0)],
            vec![DVec3::new(1.0, 0.0, 0.0), DVec3::new(1.0, 1.0, 0.0)],
        ]
    }

    #[test]
    fn test_surface_point_bilinear() {
        let knots = vec![0.0, 0.0, 1.0, 1.0];
        let p = surface_point(1, 1, &knots, &knots, &bilinear_cps(), 0.5, 0.5).unwrap();
        assert!((p.x - 0.5).abs() < 1e-10);
        assert!((p.y - 0.5).abs() < 1e-10);
        assert!(p.z.abs() < 1e-10);
    }

    #[test]
    fn test_surface_derivs_bilinear_partials() {
        let knots = vec![0.0, 0.0, 1.0, 1.0];
        let skl = surface_derivs(1, 1, &knots, &knots, &bilinear_cps(), 0.5, 0.5, 1).unwrap();

        // u direction runs along x, v along y
        assert!((skl[1][0] - DVec3::new(1.0, 0.0, 0.0)).length() < 1e-10);
        assert!((skl[0][1] - DVec3::new(0.0, 1.0, 0.0)).length() < 1e-10);
    }

    #[test]
    fn test_surface_point_rejects_bad_relations() {
        let knots = vec![0.0, 0.0, 1.0, 1.0];
        let bad_knots = vec![0.0, 1.0];
        assert!(surface_point(1, 1, &bad_knots, &knots, &bilinear_cps(), 0.5, 0.5).is_err());
    }
}
