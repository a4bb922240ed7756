//! Rational (NURBS) evaluation via homogeneous coordinates.
//!
//! Rational curves and surfaces are evaluated by running the non-rational
//! machinery on homogeneous control points `(w*x, w*y, w*z, w)` and dividing
//! out the weight afterwards. Derivatives additionally subtract the
//! binomial-weighted contributions of lower-order derivatives against
//! higher-order weight derivatives before the division (the quotient-rule
//! recombination of The NURBS Book, algorithms A4.2 and A4.4).

use spl_core::Result;
use spl_math::{binomial, HPoint, Point3, Vector3};

use super::deboor::{
    curve_derivs, curve_derivs_given_n, curve_point, curve_point_given_n, surface_derivs,
    surface_derivs_given_n_m, surface_point, surface_point_given_n_m,
};

/// Combine control points and weights into homogeneous points.
pub fn homogenize_1d(control_points: &[Point3], weights: &[f64]) -> Vec<HPoint> {
    control_points
        .iter()
        .zip(weights)
        .map(|(&p, &w)| HPoint::new(p.x * w, p.y * w, p.z * w, w))
        .collect()
}

/// Combine a control-point grid and matching weight grid into homogeneous points.
pub fn homogenize_2d(control_points: &[Vec<Point3>], weights: &[Vec<f64>]) -> Vec<Vec<HPoint>> {
    control_points
        .iter()
        .zip(weights)
        .map(|(row, wrow)| homogenize_1d(row, wrow))
        .collect()
}

/// Divide a homogeneous point by its weight component.
///
/// A zero weight yields non-finite components; degenerate geometry is left
/// visible to the caller rather than masked.
pub fn dehomogenize(point: HPoint) -> Point3 {
    point.truncate() / point.w
}

/// Evaluate a NURBS curve point at parameter `t`.
pub fn rational_curve_point(
    degree: usize,
    knots: &[f64],
    homo_control_points: &[HPoint],
    t: f64,
) -> Result<Point3> {
    Ok(dehomogenize(curve_point(
        degree,
        knots,
        homo_control_points,
        t,
    )?))
}

/// Unchecked counterpart of [`rational_curve_point`].
pub fn rational_curve_point_given_n(
    n: usize,
    degree: usize,
    knots: &[f64],
    homo_control_points: &[HPoint],
    t: f64,
) -> Point3 {
    dehomogenize(curve_point_given_n(n, degree, knots, homo_control_points, t))
}

/// Evaluate the derivatives of a NURBS curve at parameter `t`.
///
/// Returns `num_derivs + 1` vectors; index 0 is the curve point.
pub fn rational_curve_derivs(
    degree: usize,
    knots: &[f64],
    homo_control_points: &[HPoint],
    t: f64,
    num_derivs: usize,
) -> Result<Vec<Vector3>> {
    let homo_ders = curve_derivs(degree, knots, homo_control_points, t, num_derivs)?;
    Ok(dehomogenize_curve_derivs(&homo_ders))
}

/// Unchecked counterpart of [`rational_curve_derivs`].
pub fn rational_curve_derivs_given_n(
    n: usize,
    degree: usize,
    knots: &[f64],
    homo_control_points: &[HPoint],
    t: f64,
    num_derivs: usize,
) -> Vec<Vector3> {
    let homo_ders = curve_derivs_given_n(n, degree, knots, homo_control_points, t, num_derivs);
    dehomogenize_curve_derivs(&homo_ders)
}

/// Quotient-rule recombination for curve derivatives (A4.2).
///
/// Splits each homogeneous derivative into its weighted-position part `A_k`
/// and weight part `w_k`, then computes
/// `C_k = (A_k - sum_{i=1..k} C(k,i) * w_i * C_{k-i}) / w_0`.
fn dehomogenize_curve_derivs(homo_ders: &[HPoint]) -> Vec<Vector3> {
    let aders: Vec<Vector3> = homo_ders.iter().map(|d| d.truncate()).collect();
    let wders: Vec<f64> = homo_ders.iter().map(|d| d.w).collect();

    let mut ck: Vec<Vector3> = Vec::with_capacity(homo_ders.len());
    for (k, &ak) in aders.iter().enumerate() {
        let mut v = ak;
        for i in 1..=k {
            v -= ck[k - i] * (binomial(k, i) * wders[i]);
        }
        ck.push(v / wders[0]);
    }

    ck
}

/// Evaluate a NURBS surface point at parameters `(u, v)`.
#[allow(clippy::too_many_arguments)]
pub fn rational_surface_point(
    degree_u: usize,
    degree_v: usize,
    knots_u: &[f64],
    knots_v: &[f64],
    homo_control_points: &[Vec<HPoint>],
    u: f64,
    v: f64,
) -> Result<Point3> {
    Ok(dehomogenize(surface_point(
        degree_u,
        degree_v,
        knots_u,
        knots_v,
        homo_control_points,
        u,
        v,
    )?))
}

/// Unchecked counterpart of [`rational_surface_point`].
#[allow(clippy::too_many_arguments)]
pub fn rational_surface_point_given_n_m(
    n: usize,
    degree_u: usize,
    knots_u: &[f64],
    m: usize,
    degree_v: usize,
    knots_v: &[f64],
    homo_control_points: &[Vec<HPoint>],
    u: f64,
    v: f64,
) -> Point3 {
    dehomogenize(surface_point_given_n_m(
        n,
        degree_u,
        knots_u,
        m,
        degree_v,
        knots_v,
        homo_control_points,
        u,
        v,
    ))
}

/// Evaluate the partial derivatives of a NURBS surface at `(u, v)`.
///
/// Returns a triangular table: entry `[k][l]` is the mixed partial of order
/// `k` in `u` and `l` in `v`, present for `k + l <= num_derivs`; `[0][0]` is
/// the surface point.
#[allow(clippy::too_many_arguments)]
pub fn rational_surface_derivs(
    degree_u: usize,
    degree_v: usize,
    knots_u: &[f64],
    knots_v: &[f64],
    homo_control_points: &[Vec<HPoint>],
    u: f64,
    v: f64,
    num_derivs: usize,
) -> Result<Vec<Vec<Vector3>>> {
    let homo_ders = surface_derivs(
        degree_u,
        degree_v,
        knots_u,
        knots_v,
        homo_control_points,
        u,
        v,
        num_derivs,
    )?;
    Ok(dehomogenize_surface_derivs(&homo_ders, num_derivs))
}

/// Unchecked counterpart of [`rational_surface_derivs`].
#[allow(clippy::too_many_arguments)]
pub fn rational_surface_derivs_given_n_m(
    n: usize,
    degree_u: usize,
    knots_u: &[f64],
    m: usize,
    degree_v: usize,
    knots_v: &[f64],
    homo_control_points: &[Vec<HPoint>],
    u: f64,
    v: f64,
    num_derivs: usize,
) -> Vec<Vec<Vector3>> {
    let homo_ders = surface_derivs_given_n_m(
        n,
        degree_u,
        knots_u,
        m,
        degree_v,
        knots_v,
        homo_control_points,
        u,
        v,
        num_derivs,
    );
    dehomogenize_surface_derivs(&homo_ders, num_derivs)
}

/// Quotient-rule recombination for surface derivatives (A4.4), generalized
/// over the two parametric indices.
fn dehomogenize_surface_derivs(homo_ders: &[Vec<HPoint>], num_derivs: usize) -> Vec<Vec<Vector3>> {
    let w0 = homo_ders[0][0].w;

    let mut skl: Vec<Vec<Vector3>> = Vec::with_capacity(num_derivs + 1);
    for k in 0..=num_derivs {
        let mut row = Vec::with_capacity(num_derivs - k + 1);

        for l in 0..=num_derivs - k {
            let mut v = homo_ders[k][l].truncate();

            for j in 1..=l {
                v -= row[l - j] * (binomial(l, j) * homo_ders[0][j].w);
            }

            for i in 1..=k {
                v -= skl[k - i][l] * (binomial(k, i) * homo_ders[i][0].w);

                let mut v2 = Vector3::ZERO;
                for j in 1..=l {
                    v2 += skl[k - i][l - j] * (binomial(l, j) * homo_ders[i][j].w);
                }
                v -= v2 * binomial(k, i);
            }

            row.push(v / w0);
        }

        skl.push(row);
    }

    skl
}
