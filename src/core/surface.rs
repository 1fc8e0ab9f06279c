use ndarray::{s, Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayView3};

use crate::core::basis::{basis_derivatives, basis_functions};
use crate::core::check::{surface_is_closed_u, surface_is_closed_v, surface_is_valid, validate_surface};
use crate::core::error::NurbsError;
use crate::core::homogeneous::{accumulate_grid_point, accumulator_len, project, rational_surface_derivatives};
use crate::core::knots::{domain, find_span};
use crate::core::vector::{cross, normalized};

/// Evaluates a surface point.
///
/// # Arguments
/// * `degree_u`, `degree_v` - Degrees in the two parameter directions.
/// * `knots_u`, `knots_v` - Knot vectors; `knots_u` matches the rows of the control grid,
///   `knots_v` its columns.
/// * `control_points` - Control grid, shape `(rows_u, cols_v, dim)`.
/// * `weights` - Weight grid of shape `(rows_u, cols_v)` for a rational surface.
/// * `u`, `v` - Parameters.
///
/// # Returns
/// The point `S(u, v)` with `dim` coordinates.
#[allow(clippy::too_many_arguments)]
pub fn surface_point(
    degree_u: usize,
    degree_v: usize,
    knots_u: ArrayView1<f64>,
    knots_v: ArrayView1<f64>,
    control_points: ArrayView3<f64>,
    weights: Option<ArrayView2<f64>>,
    u: f64,
    v: f64,
) -> Array1<f64> {
    let span_u = find_span(degree_u, knots_u, u);
    let span_v = find_span(degree_v, knots_v, v);
    let basis_u = basis_functions(degree_u, span_u, knots_u, u);
    let basis_v = basis_functions(degree_v, span_v, knots_v, v);

    let dim = control_points.dim().2;
    let mut acc = Array1::<f64>::zeros(accumulator_len(dim, weights.is_some()));
    for k in 0..=degree_u {
        let i = span_u - degree_u + k;
        for l in 0..=degree_v {
            let j = span_v - degree_v + l;
            accumulate_grid_point(acc.view_mut(), basis_u[k] * basis_v[l], control_points, weights, i, j);
        }
    }

    match weights {
        Some(_) => project(acc.view()),
        None => acc,
    }
}

/// Evaluates the partial derivatives of a surface up to total order `order`.
///
/// # Returns
/// Shape `(order + 1, order + 1, dim)`. Entry `[k, l, ..]` is `∂^{k+l} S / ∂u^k ∂v^l` for
/// `k + l <= order`; the remaining entries are zero. `[0, 0, ..]` is the point itself.
#[allow(clippy::too_many_arguments)]
pub fn surface_derivatives(
    degree_u: usize,
    degree_v: usize,
    knots_u: ArrayView1<f64>,
    knots_v: ArrayView1<f64>,
    control_points: ArrayView3<f64>,
    weights: Option<ArrayView2<f64>>,
    u: f64,
    v: f64,
    order: usize,
) -> Array3<f64> {
    let du = order.min(degree_u);
    let dv = order.min(degree_v);
    let span_u = find_span(degree_u, knots_u, u);
    let span_v = find_span(degree_v, knots_v, v);
    let nu = basis_derivatives(degree_u, span_u, knots_u, u, du);
    let nv = basis_derivatives(degree_v, span_v, knots_v, v, dv);

    let dim = control_points.dim().2;
    let len = accumulator_len(dim, weights.is_some());
    let mut hders = Array3::<f64>::zeros((order + 1, order + 1, len));
    for k in 0..=du {
        for l in 0..=(order - k).min(dv) {
            let mut acc = hders.slice_mut(s![k, l, ..]);
            for r in 0..=degree_u {
                let i = span_u - degree_u + r;
                for t in 0..=degree_v {
                    let j = span_v - degree_v + t;
                    accumulate_grid_point(acc.view_mut(), nu[[k, r]] * nv[[l, t]], control_points, weights, i, j);
                }
            }
        }
    }

    match weights {
        Some(_) => rational_surface_derivatives(hders.view()),
        None => hders,
    }
}

/// Unit tangents `(S_u / |S_u|, S_v / |S_v|)`; each is `None` where its partial vanishes,
/// as along a collapsed edge.
#[allow(clippy::too_many_arguments)]
pub fn surface_tangent(
    degree_u: usize,
    degree_v: usize,
    knots_u: ArrayView1<f64>,
    knots_v: ArrayView1<f64>,
    control_points: ArrayView3<f64>,
    weights: Option<ArrayView2<f64>>,
    u: f64,
    v: f64,
) -> (Option<Array1<f64>>, Option<Array1<f64>>) {
    let ders = surface_derivatives(degree_u, degree_v, knots_u, knots_v, control_points, weights, u, v, 1);
    (
        normalized(ders.slice(s![1, 0, ..])),
        normalized(ders.slice(s![0, 1, ..])),
    )
}

/// Unit normal `S_u x S_v / |S_u x S_v|` of a 3D surface.
///
/// `None` when the control points are not 3D or the partials are parallel or vanish.
#[allow(clippy::too_many_arguments)]
pub fn surface_normal(
    degree_u: usize,
    degree_v: usize,
    knots_u: ArrayView1<f64>,
    knots_v: ArrayView1<f64>,
    control_points: ArrayView3<f64>,
    weights: Option<ArrayView2<f64>>,
    u: f64,
    v: f64,
) -> Option<Array1<f64>> {
    if control_points.dim().2 != 3 {
        return None;
    }
    let ders = surface_derivatives(degree_u, degree_v, knots_u, knots_v, control_points, weights, u, v, 1);
    let n = cross(ders.slice(s![1, 0, ..]), ders.slice(s![0, 1, ..]));
    normalized(n.view())
}

/// A B-spline or NURBS surface. The control grid is indexed `[i, j, coord]` with `i` running
/// along u and `j` along v.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub degree_u: usize,
    pub degree_v: usize,
    pub knots_u: Array1<f64>,
    pub knots_v: Array1<f64>,
    pub control_points: Array3<f64>,
    pub weights: Option<Array2<f64>>,
}

impl Surface {
    pub fn new(
        degree_u: usize,
        degree_v: usize,
        knots_u: Array1<f64>,
        knots_v: Array1<f64>,
        control_points: Array3<f64>,
    ) -> Self {
        Self {
            degree_u,
            degree_v,
            knots_u,
            knots_v,
            control_points,
            weights: None,
        }
    }

    pub fn rational(
        degree_u: usize,
        degree_v: usize,
        knots_u: Array1<f64>,
        knots_v: Array1<f64>,
        control_points: Array3<f64>,
        weights: Array2<f64>,
    ) -> Self {
        Self {
            degree_u,
            degree_v,
            knots_u,
            knots_v,
            control_points,
            weights: Some(weights),
        }
    }

    /// Builds a surface after running [`validate_surface`] on it.
    pub fn try_new(
        degree_u: usize,
        degree_v: usize,
        knots_u: Array1<f64>,
        knots_v: Array1<f64>,
        control_points: Array3<f64>,
        weights: Option<Array2<f64>>,
    ) -> Result<Self, NurbsError> {
        let surface = Self {
            degree_u,
            degree_v,
            knots_u,
            knots_v,
            control_points,
            weights,
        };
        if let Err(e) = surface.validate() {
            log::debug!(
                "rejecting surface of degree ({}, {}): {}",
                surface.degree_u,
                surface.degree_v,
                e
            );
            return Err(e);
        }
        Ok(surface)
    }

    fn weights_view(&self) -> Option<ArrayView2<f64>> {
        self.weights.as_ref().map(|w| w.view())
    }

    fn validate(&self) -> Result<(), NurbsError> {
        validate_surface(
            self.degree_u,
            self.degree_v,
            self.knots_u.view(),
            self.knots_v.view(),
            self.control_points.view(),
            self.weights_view(),
        )
    }

    pub fn is_rational(&self) -> bool {
        self.weights.is_some()
    }

    pub fn dimension(&self) -> usize {
        self.control_points.dim().2
    }

    /// `((u_start, u_end), (v_start, v_end))`.
    pub fn domain(&self) -> ((f64, f64), (f64, f64)) {
        (
            domain(self.degree_u, self.knots_u.view()),
            domain(self.degree_v, self.knots_v.view()),
        )
    }

    pub fn point(&self, u: f64, v: f64) -> Array1<f64> {
        surface_point(
            self.degree_u,
            self.degree_v,
            self.knots_u.view(),
            self.knots_v.view(),
            self.control_points.view(),
            self.weights_view(),
            u,
            v,
        )
    }

    /// See [`surface_derivatives`].
    pub fn derivatives(&self, u: f64, v: f64, order: usize) -> Array3<f64> {
        surface_derivatives(
            self.degree_u,
            self.degree_v,
            self.knots_u.view(),
            self.knots_v.view(),
            self.control_points.view(),
            self.weights_view(),
            u,
            v,
            order,
        )
    }

    pub fn tangent(&self, u: f64, v: f64) -> (Option<Array1<f64>>, Option<Array1<f64>>) {
        surface_tangent(
            self.degree_u,
            self.degree_v,
            self.knots_u.view(),
            self.knots_v.view(),
            self.control_points.view(),
            self.weights_view(),
            u,
            v,
        )
    }

    pub fn normal(&self, u: f64, v: f64) -> Option<Array1<f64>> {
        surface_normal(
            self.degree_u,
            self.degree_v,
            self.knots_u.view(),
            self.knots_v.view(),
            self.control_points.view(),
            self.weights_view(),
            u,
            v,
        )
    }

    pub fn is_valid(&self) -> bool {
        surface_is_valid(
            self.degree_u,
            self.degree_v,
            self.knots_u.view(),
            self.knots_v.view(),
            self.control_points.view(),
            self.weights_view(),
        )
    }

    pub fn is_closed_u(&self) -> bool {
        surface_is_closed_u(self.degree_u, self.knots_u.view(), self.control_points.view(), self.weights_view())
    }

    pub fn is_closed_v(&self) -> bool {
        surface_is_closed_v(self.degree_v, self.knots_v.view(), self.control_points.view(), self.weights_view())
    }
}
