//! B-spline basis functions and their derivatives (Cox-de Boor recurrence).
//!
//! All routines take a degree `p`, a knot vector and a parameter `u`. Those that
//! evaluate every nonzero function at once also take the span from
//! [`crate::core::knots::find_span`]; the `p + 1` values they return belong to the
//! basis functions `N_{span-p}, ..., N_{span}`.

use ndarray::{Array1, Array2, ArrayView1};

use crate::core::tolerance::SPAN_SNAP_EPSILON;

/// `num / den`, or 0 when the knot difference `den` vanishes (coincident knots).
#[inline]
fn ratio(num: f64, den: f64) -> f64 {
    if den.abs() < f64::EPSILON {
        0.0
    } else {
        num / den
    }
}

/// Evaluates the single basis function `N_{index,p}(u)`.
///
/// # Arguments
/// * `index` - Index of the basis function (0-indexed, `< num_control_points`).
/// * `degree` - Degree (p).
/// * `knots` - Knot vector of length `num_control_points + p + 1`.
/// * `u` - Evaluation parameter.
///
/// # Returns
/// The value of `N_{index,p}(u)`. The first function is exactly 1 at the first knot and the
/// last function is exactly 1 at the end of the domain; any function is exactly 0 outside its
/// support `[knots[index], knots[index + p + 1])`.
pub fn one_basis(index: usize, degree: usize, knots: ArrayView1<f64>, u: f64) -> f64 {
    let num_control_points = knots.len() - degree - 1;
    let last = num_control_points - 1;

    let close = |a: f64, b: f64| (a - b).abs() <= SPAN_SNAP_EPSILON;
    if (index == 0 && close(u, knots[0])) || (index == last && close(u, knots[last + 1])) {
        return 1.0;
    }

    let out_of_span = |start: f64, end: f64| u < start || u >= end;
    if out_of_span(knots[index], knots[index + degree + 1]) {
        return 0.0;
    }

    // Degree-0 functions of the support
    let mut n: Vec<f64> = (0..=degree)
        .map(|j| if out_of_span(knots[index + j], knots[index + j + 1]) { 0.0 } else { 1.0 })
        .collect();

    for k in 1..=degree {
        let mut saved = if n[0] == 0.0 {
            0.0
        } else {
            ((u - knots[index]) * n[0]) / (knots[index + k] - knots[index])
        };
        for j in 0..(degree - k + 1) {
            let left = knots[index + j + 1];
            let right = knots[index + j + k + 1];
            if n[j + 1] == 0.0 {
                n[j] = saved;
                saved = 0.0;
            } else {
                let temp = n[j + 1] / (right - left);
                n[j] = saved + (right - u) * temp;
                saved = (u - left) * temp;
            }
        }
    }
    n[0]
}

/// Evaluates all `p + 1` nonzero basis functions at `u`.
///
/// # Arguments
/// * `degree` - Degree (p).
/// * `span` - Span of `u`, as returned by `find_span(degree, knots, u)`.
/// * `knots` - Knot vector.
/// * `u` - Evaluation parameter.
///
/// # Returns
/// `[N_{span-p,p}(u), ..., N_{span,p}(u)]`. The values sum to 1 inside the domain.
pub fn basis_functions(degree: usize, span: usize, knots: ArrayView1<f64>, u: f64) -> Array1<f64> {
    let mut basis = Array1::<f64>::zeros(degree + 1);
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];

    basis[0] = 1.0;
    for j in 1..=degree {
        left[j] = u - knots[span + 1 - j];
        right[j] = knots[span + j] - u;
        let mut saved = 0.0;
        for r in 0..j {
            let temp = ratio(basis[r], right[r + 1] + left[j - r]);
            basis[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        basis[j] = saved;
    }
    basis
}

/// Evaluates the nonzero basis functions and their derivatives up to `order` at `u`.
///
/// # Arguments
/// * `degree` - Degree (p).
/// * `span` - Span of `u`, as returned by `find_span(degree, knots, u)`.
/// * `knots` - Knot vector.
/// * `u` - Evaluation parameter.
/// * `order` - Highest derivative order requested (n).
///
/// # Returns
/// A table of shape `(n + 1, p + 1)` where entry `[k, j]` is the k-th derivative of
/// `N_{span-p+j,p}` at `u`. Row 0 is identical to [`basis_functions`]. Rows above `p` are zero.
pub fn basis_derivatives(
    degree: usize,
    span: usize,
    knots: ArrayView1<f64>,
    u: f64,
    order: usize,
) -> Array2<f64> {
    let p = degree;
    let mut left = vec![0.0; p + 1];
    let mut right = vec![0.0; p + 1];

    // Upper triangle (incl. diagonal): basis values of increasing degree, column j = degree j.
    // Strict lower triangle: knot differences used as denominators.
    let mut ndu = Array2::<f64>::zeros((p + 1, p + 1));
    ndu[[0, 0]] = 1.0;
    for j in 1..=p {
        left[j] = u - knots[span + 1 - j];
        right[j] = knots[span + j] - u;
        let mut saved = 0.0;
        for r in 0..j {
            ndu[[j, r]] = right[r + 1] + left[j - r];
            let temp = ratio(ndu[[r, j - 1]], ndu[[j, r]]);
            ndu[[r, j]] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        ndu[[j, j]] = saved;
    }

    let mut ders = Array2::<f64>::zeros((order + 1, p + 1));
    for j in 0..=p {
        ders[[0, j]] = ndu[[j, p]];
    }

    // Derivatives of degree p vanish above order p.
    let n = order.min(p);

    // Two alternating rows of coefficients a_{k,j}.
    let mut a = Array2::<f64>::zeros((2, p + 1));
    for r in 0..=p {
        let (mut s1, mut s2) = (0, 1);
        a[[0, 0]] = 1.0;

        for k in 1..=n {
            let mut d = 0.0;
            let rk = r as isize - k as isize;
            let pk = p - k;

            if r >= k {
                let rk = r - k;
                a[[s2, 0]] = ratio(a[[s1, 0]], ndu[[pk + 1, rk]]);
                d = a[[s2, 0]] * ndu[[rk, pk]];
            }

            let j1 = if rk >= -1 { 1 } else { (-rk) as usize };
            let j2 = if r <= pk + 1 { k - 1 } else { p - r };
            for j in j1..=j2 {
                let col = (rk + j as isize) as usize;
                a[[s2, j]] = ratio(a[[s1, j]] - a[[s1, j - 1]], ndu[[pk + 1, col]]);
                d += a[[s2, j]] * ndu[[col, pk]];
            }

            if r <= pk {
                a[[s2, k]] = ratio(-a[[s1, k - 1]], ndu[[pk + 1, r]]);
                d += a[[s2, k]] * ndu[[r, pk]];
            }

            ders[[k, r]] = d;
            std::mem::swap(&mut s1, &mut s2);
        }
    }

    // Multiply through by p! / (p - k)!
    let mut fac = p as f64;
    for k in 1..=n {
        ders.row_mut(k).mapv_inplace(|v| v * fac);
        fac *= (p - k) as f64;
    }

    ders
}
