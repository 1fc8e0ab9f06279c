//! Validity and closedness checks for curves and surfaces.
//!
//! The evaluators in [`crate::core::curve`] and [`crate::core::surface`] trust their input;
//! these predicates are what a caller consults before trusting evaluator output.

use ndarray::{ArrayView1, ArrayView2, ArrayView3, Axis};

use crate::core::error::NurbsError;
use crate::core::knots::validate_knots;
use crate::core::tolerance::Tolerances;
use crate::core::vector::norm;

/// Smallest supported degree.
pub const MIN_DEGREE: usize = 1;
/// Largest supported degree.
pub const MAX_DEGREE: usize = 9;

/// `num_knots - degree - 1 == num_control_points`.
pub fn is_valid_relation(degree: usize, num_knots: usize, num_control_points: usize) -> bool {
    num_knots.checked_sub(degree + 1) == Some(num_control_points)
}

pub fn is_valid_degree(degree: usize) -> bool {
    (MIN_DEGREE..=MAX_DEGREE).contains(&degree)
}

/// Whether the knots are in non-decreasing order.
pub fn is_knot_vector_monotonic(knots: ArrayView1<f64>) -> bool {
    knots.iter().zip(knots.iter().skip(1)).all(|(a, b)| a <= b)
}

fn validate_degree(degree: usize) -> Result<(), NurbsError> {
    if is_valid_degree(degree) {
        Ok(())
    } else {
        Err(NurbsError::InvalidDegree {
            degree,
            min: MIN_DEGREE,
            max: MAX_DEGREE,
        })
    }
}

fn validate_weight_values<'a>(weights: impl Iterator<Item = &'a f64>) -> Result<(), NurbsError> {
    for (index, &value) in weights.enumerate() {
        if !value.is_finite() || value <= 0.0 {
            return Err(NurbsError::NonPositiveWeight { index, value });
        }
    }
    Ok(())
}

/// Checks a (possibly rational) curve.
///
/// # Returns
/// `Ok(())` when the degree lies in `[MIN_DEGREE, MAX_DEGREE]`, the knot count matches
/// `num_control_points + degree + 1`, the knots are non-decreasing, and (for rational curves)
/// there is exactly one finite positive weight per control point. Otherwise the first failed check.
pub fn validate_curve(
    degree: usize,
    knots: ArrayView1<f64>,
    control_points: ArrayView2<f64>,
    weights: Option<ArrayView1<f64>>,
) -> Result<(), NurbsError> {
    validate_degree(degree)?;
    let (num_points, dim) = control_points.dim();
    if num_points == 0 || dim == 0 {
        return Err(NurbsError::EmptyControlNet);
    }
    validate_knots(degree, knots, num_points)?;

    if let Some(weights) = weights {
        if weights.len() != num_points {
            return Err(NurbsError::WeightCountMismatch {
                control_points: num_points,
                weights: weights.len(),
            });
        }
        validate_weight_values(weights.iter())?;
    }
    Ok(())
}

/// Checks a (possibly rational) surface. Rows of the control grid run along u, columns along v.
pub fn validate_surface(
    degree_u: usize,
    degree_v: usize,
    knots_u: ArrayView1<f64>,
    knots_v: ArrayView1<f64>,
    control_points: ArrayView3<f64>,
    weights: Option<ArrayView2<f64>>,
) -> Result<(), NurbsError> {
    validate_degree(degree_u)?;
    validate_degree(degree_v)?;
    let (rows, cols, dim) = control_points.dim();
    if rows == 0 || cols == 0 || dim == 0 {
        return Err(NurbsError::EmptyControlNet);
    }
    validate_knots(degree_u, knots_u, rows)?;
    validate_knots(degree_v, knots_v, cols)?;

    if let Some(weights) = weights {
        if weights.dim() != (rows, cols) {
            return Err(NurbsError::WeightShapeMismatch {
                control_points: (rows, cols),
                weights: weights.dim(),
            });
        }
        validate_weight_values(weights.iter())?;
    }
    Ok(())
}

/// Boolean form of [`validate_curve`].
pub fn curve_is_valid(
    degree: usize,
    knots: ArrayView1<f64>,
    control_points: ArrayView2<f64>,
    weights: Option<ArrayView1<f64>>,
) -> bool {
    match validate_curve(degree, knots, control_points, weights) {
        Ok(()) => true,
        Err(e) => {
            log::debug!("invalid curve: {}", e);
            false
        }
    }
}

/// Boolean form of [`validate_surface`].
pub fn surface_is_valid(
    degree_u: usize,
    degree_v: usize,
    knots_u: ArrayView1<f64>,
    knots_v: ArrayView1<f64>,
    control_points: ArrayView3<f64>,
    weights: Option<ArrayView2<f64>>,
) -> bool {
    match validate_surface(degree_u, degree_v, knots_u, knots_v, control_points, weights) {
        Ok(()) => true,
        Err(e) => {
            log::debug!("invalid surface: {}", e);
            false
        }
    }
}

/// Whether the knot spacing near the start repeats near the end, which a periodic
/// (closed) knot vector requires: for `i < degree - 1`,
/// `knots[i+1] - knots[i] == knots[j+1] - knots[j]` with `j = len - degree + i`.
///
/// Spacings are compared within `tol.knot_spacing` scaled by the knot range (at least 1).
pub fn is_knot_vector_closed(degree: usize, knots: ArrayView1<f64>, tol: &Tolerances) -> bool {
    let len = knots.len();
    if len < degree + 1 {
        return false;
    }
    let eps = tol.knot_spacing * (knots[len - 1] - knots[0]).abs().max(1.0);
    (0..degree.saturating_sub(1)).all(|i| {
        let j = len - degree + i;
        let head = knots[i + 1] - knots[i];
        let tail = knots[j + 1] - knots[j];
        (head - tail).abs() <= eps
    })
}

/// Whether the first `degree` control points coincide with the last `degree` ones.
pub fn is_points_closed(degree: usize, control_points: ArrayView2<f64>, tol: &Tolerances) -> bool {
    let n = control_points.nrows();
    if n < degree {
        return false;
    }
    (0..degree).all(|i| {
        let diff = &control_points.row(i) - &control_points.row(n - degree + i);
        norm(diff.view()) <= tol.closed_point
    })
}

/// Weight counterpart of [`is_points_closed`].
pub fn is_weights_closed(degree: usize, weights: ArrayView1<f64>, tol: &Tolerances) -> bool {
    is_points_closed(degree, weights.insert_axis(Axis(1)), tol)
}

/// Whether the first `degree_u` rows of the grid coincide with the last `degree_u` rows.
pub fn is_grid_closed_u(degree_u: usize, grid: ArrayView3<f64>, tol: &Tolerances) -> bool {
    let (rows, cols, _) = grid.dim();
    if rows < degree_u {
        return false;
    }
    (0..degree_u).all(|i| {
        let k = rows - degree_u + i;
        (0..cols).all(|j| is_same_point(grid, (i, j), (k, j), tol))
    })
}

/// Whether the first `degree_v` columns of the grid coincide with the last `degree_v` columns.
pub fn is_grid_closed_v(degree_v: usize, grid: ArrayView3<f64>, tol: &Tolerances) -> bool {
    let (rows, cols, _) = grid.dim();
    if cols < degree_v {
        return false;
    }
    (0..rows).all(|i| {
        (0..degree_v).all(|j| is_same_point(grid, (i, j), (i, cols - degree_v + j), tol))
    })
}

fn is_same_point(grid: ArrayView3<f64>, a: (usize, usize), b: (usize, usize), tol: &Tolerances) -> bool {
    let pa = grid.index_axis(Axis(0), a.0);
    let pb = grid.index_axis(Axis(0), b.0);
    let diff = &pa.row(a.1) - &pb.row(b.1);
    norm(diff.view()) <= tol.closed_point
}

/// Closedness of a (possibly rational) curve with default tolerances.
pub fn curve_is_closed(
    degree: usize,
    knots: ArrayView1<f64>,
    control_points: ArrayView2<f64>,
    weights: Option<ArrayView1<f64>>,
) -> bool {
    curve_is_closed_with_tol(degree, knots, control_points, weights, &Tolerances::DEFAULT)
}

/// A curve is closed when its control points, its weights (if any) and its knot spacing
/// all wrap around over `degree` entries.
pub fn curve_is_closed_with_tol(
    degree: usize,
    knots: ArrayView1<f64>,
    control_points: ArrayView2<f64>,
    weights: Option<ArrayView1<f64>>,
    tol: &Tolerances,
) -> bool {
    is_points_closed(degree, control_points, tol)
        && weights.map_or(true, |w| is_weights_closed(degree, w, tol))
        && is_knot_vector_closed(degree, knots, tol)
}

/// Closedness of a surface along u with default tolerances.
pub fn surface_is_closed_u(
    degree_u: usize,
    knots_u: ArrayView1<f64>,
    control_points: ArrayView3<f64>,
    weights: Option<ArrayView2<f64>>,
) -> bool {
    surface_is_closed_u_with_tol(degree_u, knots_u, control_points, weights, &Tolerances::DEFAULT)
}

pub fn surface_is_closed_u_with_tol(
    degree_u: usize,
    knots_u: ArrayView1<f64>,
    control_points: ArrayView3<f64>,
    weights: Option<ArrayView2<f64>>,
    tol: &Tolerances,
) -> bool {
    is_grid_closed_u(degree_u, control_points, tol)
        && is_knot_vector_closed(degree_u, knots_u, tol)
        && weights.map_or(true, |w| is_grid_closed_u(degree_u, w.insert_axis(Axis(2)), tol))
}

/// Closedness of a surface along v with default tolerances.
pub fn surface_is_closed_v(
    degree_v: usize,
    knots_v: ArrayView1<f64>,
    control_points: ArrayView3<f64>,
    weights: Option<ArrayView2<f64>>,
) -> bool {
    surface_is_closed_v_with_tol(degree_v, knots_v, control_points, weights, &Tolerances::DEFAULT)
}

pub fn surface_is_closed_v_with_tol(
    degree_v: usize,
    knots_v: ArrayView1<f64>,
    control_points: ArrayView3<f64>,
    weights: Option<ArrayView2<f64>>,
    tol: &Tolerances,
) -> bool {
    is_grid_closed_v(degree_v, control_points, tol)
        && is_knot_vector_closed(degree_v, knots_v, tol)
        && weights.map_or(true, |w| is_grid_closed_v(degree_v, w.insert_axis(Axis(2)), tol))
}
