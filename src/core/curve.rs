use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::core::basis::{basis_derivatives, basis_functions};
use crate::core::check::{curve_is_closed, curve_is_valid, validate_curve};
use crate::core::error::NurbsError;
use crate::core::homogeneous::{accumulate_point, accumulator_len, project, rational_curve_derivatives};
use crate::core::knots::{domain, find_span};
use crate::core::tolerance::DEGENERATE_LENGTH;
use crate::core::vector::{cross, norm, normalized};

/// Evaluates a curve point.
///
/// # Arguments
/// * `degree` - Degree (p).
/// * `knots` - Knot vector of length `n + p + 1`.
/// * `control_points` - Control points, shape `(n, dim)`.
/// * `weights` - One weight per control point for a rational curve, `None` for a plain B-spline.
/// * `u` - Parameter; values outside the domain evaluate the nearest boundary span.
///
/// # Returns
/// The point `C(u)` with `dim` coordinates.
pub fn curve_point(
    degree: usize,
    knots: ArrayView1<f64>,
    control_points: ArrayView2<f64>,
    weights: Option<ArrayView1<f64>>,
    u: f64,
) -> Array1<f64> {
    let span = find_span(degree, knots, u);
    let basis = basis_functions(degree, span, knots, u);

    let dim = control_points.ncols();
    let mut acc = Array1::<f64>::zeros(accumulator_len(dim, weights.is_some()));
    for j in 0..=degree {
        accumulate_point(acc.view_mut(), basis[j], control_points, weights, span - degree + j);
    }

    match weights {
        Some(_) => project(acc.view()),
        None => acc,
    }
}

/// Evaluates a curve point and its derivatives up to `order`.
///
/// # Returns
/// Shape `(order + 1, dim)`: row 0 is `C(u)`, row `k` is the k-th derivative `C^(k)(u)`.
/// For plain B-splines rows above `degree` are zero.
pub fn curve_derivatives(
    degree: usize,
    knots: ArrayView1<f64>,
    control_points: ArrayView2<f64>,
    weights: Option<ArrayView1<f64>>,
    u: f64,
    order: usize,
) -> Array2<f64> {
    let span = find_span(degree, knots, u);
    let nders = basis_derivatives(degree, span, knots, u, order);

    let dim = control_points.ncols();
    let mut hders = Array2::<f64>::zeros((order + 1, accumulator_len(dim, weights.is_some())));
    for k in 0..=order.min(degree) {
        for j in 0..=degree {
            accumulate_point(hders.row_mut(k), nders[[k, j]], control_points, weights, span - degree + j);
        }
    }

    match weights {
        Some(_) => rational_curve_derivatives(hders.view()),
        None => hders,
    }
}

/// Unit tangent `C'(u) / |C'(u)|`, or `None` where the first derivative vanishes.
pub fn curve_tangent(
    degree: usize,
    knots: ArrayView1<f64>,
    control_points: ArrayView2<f64>,
    weights: Option<ArrayView1<f64>>,
    u: f64,
) -> Option<Array1<f64>> {
    let ders = curve_derivatives(degree, knots, control_points, weights, u, 1);
    normalized(ders.row(1))
}

/// Frenet frame of a 3D curve.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveFrame {
    pub tangent: Array1<f64>,
    /// Principal normal, pointing towards the center of curvature.
    pub normal: Array1<f64>,
    pub binormal: Array1<f64>,
}

/// A B-spline or NURBS curve.
///
/// Plain data: the owner may edit any field between evaluations. [`Curve::try_new`] runs the
/// validity checks once; the evaluation methods never do.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub degree: usize,
    pub knots: Array1<f64>,
    /// Shape `(num_control_points, dim)`.
    pub control_points: Array2<f64>,
    /// `None` for a non-rational curve.
    pub weights: Option<Array1<f64>>,
}

impl Curve {
    /// Non-rational curve, unchecked.
    pub fn new(degree: usize, knots: Array1<f64>, control_points: Array2<f64>) -> Self {
        Self {
            degree,
            knots,
            control_points,
            weights: None,
        }
    }

    /// Rational curve, unchecked.
    pub fn rational(degree: usize, knots: Array1<f64>, control_points: Array2<f64>, weights: Array1<f64>) -> Self {
        Self {
            degree,
            knots,
            control_points,
            weights: Some(weights),
        }
    }

    /// Builds a curve after running [`validate_curve`] on it.
    pub fn try_new(
        degree: usize,
        knots: Array1<f64>,
        control_points: Array2<f64>,
        weights: Option<Array1<f64>>,
    ) -> Result<Self, NurbsError> {
        if let Err(e) = validate_curve(degree, knots.view(), control_points.view(), weights.as_ref().map(|w| w.view())) {
            log::debug!("rejecting curve of degree {}: {}", degree, e);
            return Err(e);
        }
        Ok(Self {
            degree,
            knots,
            control_points,
            weights,
        })
    }

    fn weights_view(&self) -> Option<ArrayView1<f64>> {
        self.weights.as_ref().map(|w| w.view())
    }

    pub fn is_rational(&self) -> bool {
        self.weights.is_some()
    }

    /// Number of coordinates per control point.
    pub fn dimension(&self) -> usize {
        self.control_points.ncols()
    }

    /// Parametric domain `(u_start, u_end)`.
    pub fn domain(&self) -> (f64, f64) {
        domain(self.degree, self.knots.view())
    }

    pub fn point(&self, u: f64) -> Array1<f64> {
        curve_point(self.degree, self.knots.view(), self.control_points.view(), self.weights_view(), u)
    }

    /// See [`curve_derivatives`].
    pub fn derivatives(&self, u: f64, order: usize) -> Array2<f64> {
        curve_derivatives(
            self.degree,
            self.knots.view(),
            self.control_points.view(),
            self.weights_view(),
            u,
            order,
        )
    }

    pub fn tangent(&self, u: f64) -> Option<Array1<f64>> {
        curve_tangent(self.degree, self.knots.view(), self.control_points.view(), self.weights_view(), u)
    }

    /// Frenet frame at `u`. `None` for curves that are not 3D and where the frame is undefined
    /// (zero first derivative, or first and second derivatives parallel as on a straight line).
    pub fn frame(&self, u: f64) -> Option<CurveFrame> {
        if self.dimension() != 3 {
            return None;
        }
        let ders = self.derivatives(u, 2);
        let tangent = normalized(ders.row(1))?;
        let binormal = normalized(cross(ders.row(1), ders.row(2)).view())?;
        let normal = cross(binormal.view(), tangent.view());
        Some(CurveFrame {
            tangent,
            normal,
            binormal,
        })
    }

    /// Curvature `|C' x C''| / |C'|^3` of a 3D curve; `None` if not 3D or `C'` vanishes.
    pub fn curvature(&self, u: f64) -> Option<f64> {
        if self.dimension() != 3 {
            return None;
        }
        let ders = self.derivatives(u, 2);
        let speed = norm(ders.row(1));
        if speed < DEGENERATE_LENGTH {
            return None;
        }
        Some(norm(cross(ders.row(1), ders.row(2)).view()) / speed.powi(3))
    }

    pub fn is_valid(&self) -> bool {
        curve_is_valid(self.degree, self.knots.view(), self.control_points.view(), self.weights_view())
    }

    pub fn is_closed(&self) -> bool {
        curve_is_closed(self.degree, self.knots.view(), self.control_points.view(), self.weights_view())
    }
}
