//! Homogeneous (weighted) accumulation and the projection back to Cartesian space.
//!
//! A rational control point `P` with weight `w` is lifted to `(w·P, w)`. Sums of lifted
//! points are ordinary B-spline sums, so points and derivatives of a rational curve or
//! surface are computed in homogeneous space and then projected. Plain (non-rational)
//! data skips the lift entirely, which is the same as an implicit weight of 1.

use ndarray::{s, Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, ArrayViewMut1};
use num_integer::binomial;

/// Number of coordinates of an accumulator for `dim`-dimensional control points.
#[inline]
pub(crate) fn accumulator_len(dim: usize, rational: bool) -> usize {
    if rational {
        dim + 1
    } else {
        dim
    }
}

/// `acc += coeff · lift(P[idx])`.
///
/// `acc` has `dim + 1` entries when `weights` is present and `dim` entries otherwise.
#[inline]
pub(crate) fn accumulate_point(
    mut acc: ArrayViewMut1<f64>,
    coeff: f64,
    control_points: ArrayView2<f64>,
    weights: Option<ArrayView1<f64>>,
    idx: usize,
) {
    let point = control_points.row(idx);
    match weights {
        Some(w) => {
            let cw = coeff * w[idx];
            let dim = point.len();
            acc.slice_mut(s![..dim]).scaled_add(cw, &point);
            acc[dim] += cw;
        }
        None => acc.scaled_add(coeff, &point),
    }
}

/// `acc += coeff · lift(P[i, j])` for a surface control grid.
#[inline]
pub(crate) fn accumulate_grid_point(
    mut acc: ArrayViewMut1<f64>,
    coeff: f64,
    control_points: ArrayView3<f64>,
    weights: Option<ArrayView2<f64>>,
    i: usize,
    j: usize,
) {
    let point = control_points.slice(s![i, j, ..]);
    match weights {
        Some(w) => {
            let cw = coeff * w[[i, j]];
            let dim = point.len();
            acc.slice_mut(s![..dim]).scaled_add(cw, &point);
            acc[dim] += cw;
        }
        None => acc.scaled_add(coeff, &point),
    }
}

/// Projects a homogeneous point `(w·x, w)` to `x`.
///
/// A zero weight yields non-finite coordinates; weights are expected to be positive.
pub fn project(homogeneous: ArrayView1<f64>) -> Array1<f64> {
    let dim = homogeneous.len() - 1;
    let w = homogeneous[dim];
    homogeneous.slice(s![..dim]).mapv(|x| x / w)
}

/// Turns derivatives of a homogeneous curve into derivatives of the rational curve.
///
/// # Arguments
/// * `hders` - Shape `(d + 1, dim + 1)`: row `k` is the k-th derivative of `(w·C, w)`.
///
/// # Returns
/// Shape `(d + 1, dim)`: row `k` is the k-th derivative of `C`, obtained from the Leibniz rule
/// `C^(k) = (A^(k) - Σ_{i=1..k} binom(k, i) · w^(i) · C^(k-i)) / w^(0)`.
pub fn rational_curve_derivatives(hders: ArrayView2<f64>) -> Array2<f64> {
    let (rows, cols) = hders.dim();
    let dim = cols - 1;
    let aders = hders.slice(s![.., ..dim]);
    let wders = hders.column(dim);

    let mut ck = Array2::<f64>::zeros((rows, dim));
    for k in 0..rows {
        let mut v = aders.row(k).to_owned();
        for i in 1..=k {
            let coeff = binomial(k, i) as f64 * wders[i];
            v.scaled_add(-coeff, &ck.row(k - i));
        }
        v /= wders[0];
        ck.row_mut(k).assign(&v);
    }
    ck
}

/// Two-parameter version of [`rational_curve_derivatives`].
///
/// # Arguments
/// * `hders` - Shape `(d + 1, d + 1, dim + 1)`: entry `[k, l]` is `∂^{k+l}/∂u^k∂v^l (w·S, w)`.
///
/// # Returns
/// Shape `(d + 1, d + 1, dim)` with the mixed partials of `S` for `k + l <= d`; entries with
/// `k + l > d` are left zero.
pub fn rational_surface_derivatives(hders: ArrayView3<f64>) -> Array3<f64> {
    let (rows, _, cols) = hders.dim();
    let d = rows - 1;
    let dim = cols - 1;
    let w = |k: usize, l: usize| hders[[k, l, dim]];

    let mut skl = Array3::<f64>::zeros((rows, rows, dim));
    for k in 0..=d {
        for l in 0..=(d - k) {
            let mut v = hders.slice(s![k, l, ..dim]).to_owned();
            for j in 1..=l {
                let coeff = binomial(l, j) as f64 * w(0, j);
                v.scaled_add(-coeff, &skl.slice(s![k, l - j, ..]));
            }
            for i in 1..=k {
                let coeff = binomial(k, i) as f64 * w(i, 0);
                v.scaled_add(-coeff, &skl.slice(s![k - i, l, ..]));

                let mut v2 = Array1::<f64>::zeros(dim);
                for j in 1..=l {
                    let coeff = binomial(l, j) as f64 * w(i, j);
                    v2.scaled_add(coeff, &skl.slice(s![k - i, l - j, ..]));
                }
                v.scaled_add(-(binomial(k, i) as f64), &v2);
            }
            v /= w(0, 0);
            skl.slice_mut(s![k, l, ..]).assign(&v);
        }
    }
    skl
}
