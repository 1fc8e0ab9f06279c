use ndarray::{Array1, ArrayView1};

use crate::core::check::{is_valid_degree, MAX_DEGREE, MIN_DEGREE};
use crate::core::error::NurbsError;
use crate::core::tolerance::{Tolerances, SPAN_SNAP_EPSILON};

/// Finds the knot span containing the parameter `u`.
///
/// # Arguments
/// * `degree` - Degree of the curve/surface direction (p).
/// * `knots` - Knot vector U = {u_0, ..., u_m}, with `m + 1 = num_control_points + degree + 1`.
/// * `u` - Parameter value.
///
/// # Returns
/// The span index `s` such that `knots[s] <= u < knots[s + 1]`. Parameters at (or past) the
/// end of the domain return the last span `num_control_points - 1`, parameters at (or before)
/// the start of the domain return `degree`. A NaN parameter also returns `degree`.
pub fn find_span(degree: usize, knots: ArrayView1<f64>, u: f64) -> usize {
    let num_control_points = knots.len() - degree - 1;
    let last = num_control_points - 1;

    if u.is_nan() {
        log::trace!("NaN parameter, using first span {}", degree);
        return degree;
    }

    if u >= knots[last + 1] - SPAN_SNAP_EPSILON {
        if u > knots[last + 1] {
            log::trace!("parameter {} past domain end {}, clamping to span {}", u, knots[last + 1], last);
        }
        return last;
    }
    if u <= knots[degree] + SPAN_SNAP_EPSILON {
        if u < knots[degree] {
            log::trace!("parameter {} before domain start {}, clamping to span {}", u, knots[degree], degree);
        }
        return degree;
    }

    // Upper bound: first knot strictly greater than u, then step back one.
    let mut low = 0;
    let mut high = knots.len();
    while low < high {
        let mid = (low + high) / 2;
        if knots[mid] <= u {
            low = mid + 1;
        } else {
            high = mid;
        }
    }
    low - 1
}

/// Parametric domain `[knots[degree], knots[num_control_points]]`.
pub fn domain(degree: usize, knots: ArrayView1<f64>) -> (f64, f64) {
    let num_control_points = knots.len() - degree - 1;
    (knots[degree], knots[num_control_points])
}

/// Multiplicity of the knot at `index`: the number of knots in the contiguous run of values
/// equal to `knots[index]` that contains `index`. Always at least 1.
pub fn knot_multiplicity(knots: ArrayView1<f64>, index: usize) -> usize {
    knot_multiplicity_with_tol(knots, index, &Tolerances::DEFAULT)
}

/// [`knot_multiplicity`] with knots closer than `tol.knot_multiplicity` counted as equal.
pub fn knot_multiplicity_with_tol(knots: ArrayView1<f64>, index: usize, tol: &Tolerances) -> usize {
    let eps = tol.knot_multiplicity;
    let value = knots[index];
    let same = |k: f64| (k - value).abs() <= eps;

    let before = (0..index).rev().take_while(|&i| same(knots[i])).count();
    let after = (index + 1..knots.len()).take_while(|&i| same(knots[i])).count();
    before + 1 + after
}

/// Distinct knot values with their multiplicities, in knot order.
///
/// # Example
/// `[0, 0, 0, 0.5, 1, 1, 1]` gives `[(0, 3), (0.5, 1), (1, 3)]`.
pub fn knot_multiplicities(knots: ArrayView1<f64>, tol: &Tolerances) -> Vec<(f64, usize)> {
    let mut result: Vec<(f64, usize)> = Vec::new();
    for &k in knots.iter() {
        match result.last_mut() {
            Some((value, count)) if (k - *value).abs() <= tol.knot_multiplicity => *count += 1,
            _ => result.push((k, 1)),
        }
    }
    result
}

fn check_generator_args(degree: usize, num_control_points: usize, start: f64, end: f64) -> Result<(), NurbsError> {
    if !is_valid_degree(degree) {
        return Err(NurbsError::InvalidDegree {
            degree,
            min: MIN_DEGREE,
            max: MAX_DEGREE,
        });
    }
    if num_control_points <= degree {
        return Err(NurbsError::TooFewControlPoints {
            degree,
            num_control_points,
        });
    }
    if !(start < end) {
        return Err(NurbsError::InvalidKnotRange(start, end));
    }
    Ok(())
}

/// Generates a clamped (open) knot vector with uniformly spaced interior knots.
///
/// # Arguments
/// * `degree` - Degree (p). Must satisfy `1 <= p < num_control_points`.
/// * `num_control_points` - Number of control points (n).
/// * `start` - First knot value, repeated `p + 1` times.
/// * `end` - Last knot value, repeated `p + 1` times.
///
/// # Returns
/// A knot vector of length `n + p + 1` with `n - p - 1` interior knots, or an error.
pub fn clamped_uniform_knots(
    degree: usize,
    num_control_points: usize,
    start: f64,
    end: f64,
) -> Result<Array1<f64>, NurbsError> {
    check_generator_args(degree, num_control_points, start, end)?;

    let num_internal_knots = num_control_points - degree - 1;
    let step = (end - start) / (num_internal_knots + 1) as f64;

    let mut knots_vec = Vec::with_capacity(num_control_points + degree + 1);
    knots_vec.extend(std::iter::repeat(start).take(degree + 1));
    knots_vec.extend((1..=num_internal_knots).map(|i| start + i as f64 * step));
    knots_vec.extend(std::iter::repeat(end).take(degree + 1));

    Ok(Array1::from(knots_vec))
}

/// Generates an unclamped knot vector with every spacing equal, such that the parametric
/// domain `[knots[p], knots[n]]` is exactly `[start, end]`.
///
/// This is the knot layout of closed (periodic) curves and surfaces: paired with control
/// points whose last `p` entries repeat the first `p`, it yields a seamless shape.
pub fn uniform_knots(
    degree: usize,
    num_control_points: usize,
    start: f64,
    end: f64,
) -> Result<Array1<f64>, NurbsError> {
    check_generator_args(degree, num_control_points, start, end)?;

    let step = (end - start) / (num_control_points - degree) as f64;
    let num_knots = num_control_points + degree + 1;
    let mut knots = Array1::from_iter((0..num_knots).map(|i| start + (i as f64 - degree as f64) * step));
    // Pin the domain ends so they are exact, not accumulated.
    knots[degree] = start;
    knots[num_control_points] = end;
    Ok(knots)
}

/// Validates a knot vector against a degree and a control point count.
///
/// # Arguments
/// * `degree` - Degree (p).
/// * `knots` - The knot vector to validate.
/// * `num_control_points` - Expected number of basis functions (n).
///
/// # Returns
/// `Ok(())` if `knots.len() == n + p + 1` and the knots are non-decreasing.
pub fn validate_knots(
    degree: usize,
    knots: ArrayView1<f64>,
    num_control_points: usize,
) -> Result<(), NurbsError> {
    let expected = num_control_points + degree + 1;
    if knots.len() != expected {
        return Err(NurbsError::KnotCountMismatch {
            degree,
            num_control_points,
            expected,
            actual: knots.len(),
        });
    }

    for i in 0..knots.len().saturating_sub(1) {
        // `!(a <= b)` so that NaN knots are rejected as well.
        if !(knots[i] <= knots[i + 1]) {
            return Err(NurbsError::NonMonotonicKnots {
                index: i,
                value: knots[i],
                next_value: knots[i + 1],
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    const TOL: f64 = 1e-12;

    // Helper for float array comparison
    fn assert_arr_eq(a: &Array1<f64>, b: &Array1<f64>) {
        assert_eq!(a.len(), b.len(), "Array lengths differ.");
        for (i, (val_a, val_b)) in a.iter().zip(b.iter()).enumerate() {
            assert!((val_a - val_b).abs() < TOL, "Mismatch at index {}: {} vs {}", i, val_a, val_b);
        }
    }

    #[test]
    fn test_find_span_interior() {
        // p=2, n=8: U = {0,0,0,1,2,3,4,4,5,5,5}  (NURBS book ex. 2.3)
        let knots = arr1(&[0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0, 4.0, 5.0, 5.0, 5.0]);
        assert_eq!(find_span(2, knots.view(), 2.5), 4);
        assert_eq!(find_span(2, knots.view(), 0.5), 2);
        assert_eq!(find_span(2, knots.view(), 1.0), 3); // exactly on an interior knot
        assert_eq!(find_span(2, knots.view(), 3.999), 5);
        // u = 4 has multiplicity 2; the span is the non-empty interval [4, 5)
        assert_eq!(find_span(2, knots.view(), 4.0), 7);
        assert_eq!(find_span(2, knots.view(), 4.5), 7);
    }

    #[test]
    fn test_find_span_domain_boundaries() {
        let knots = arr1(&[0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0, 4.0, 5.0, 5.0, 5.0]);
        let degree = 2;
        let last = knots.len() - degree - 2; // n - 1 = 7
        assert_eq!(find_span(degree, knots.view(), 0.0), degree);
        assert_eq!(find_span(degree, knots.view(), 5.0), last);
    }

    #[test]
    fn test_find_span_out_of_domain_clamps() {
        let knots = arr1(&[0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0]);
        assert_eq!(find_span(2, knots.view(), -3.0), 2);
        assert_eq!(find_span(2, knots.view(), 7.0), 3);
        // Within one epsilon of the end snaps to the last span.
        assert_eq!(find_span(2, knots.view(), 1.0 - f64::EPSILON / 2.0), 3);
    }

    #[test]
    fn test_find_span_nan_uses_first_span() {
        let knots = arr1(&[0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0]);
        assert_eq!(find_span(2, knots.view(), f64::NAN), 2);
    }

    #[test]
    fn test_find_span_unclamped() {
        // Uniform unclamped, p=3, n=7: domain [knots[3], knots[7]] = [3, 7]
        let knots = Array1::from_iter((0..11).map(|i| i as f64));
        assert_eq!(find_span(3, knots.view(), 3.0), 3);
        assert_eq!(find_span(3, knots.view(), 3.5), 3);
        assert_eq!(find_span(3, knots.view(), 6.2), 6);
        assert_eq!(find_span(3, knots.view(), 7.0), 6);
    }

    #[test]
    fn test_domain() {
        let knots = arr1(&[0.0, 0.0, 0.0, 0.3, 1.0, 1.0, 1.0]);
        assert_eq!(domain(2, knots.view()), (0.0, 1.0));
        let unclamped = Array1::from_iter((0..11).map(|i| i as f64));
        assert_eq!(domain(3, unclamped.view()), (3.0, 7.0));
    }

    #[test]
    fn test_knot_multiplicity() {
        let knots = arr1(&[0.0, 0.0, 0.0, 1.0, 2.0, 2.0, 3.0, 3.0, 3.0]);
        assert_eq!(knot_multiplicity(knots.view(), 0), 3);
        assert_eq!(knot_multiplicity(knots.view(), 1), 3);
        assert_eq!(knot_multiplicity(knots.view(), 2), 3);
        assert_eq!(knot_multiplicity(knots.view(), 3), 1);
        assert_eq!(knot_multiplicity(knots.view(), 4), 2);
        assert_eq!(knot_multiplicity(knots.view(), 5), 2);
        assert_eq!(knot_multiplicity(knots.view(), 8), 3);
    }

    #[test]
    fn test_knot_multiplicity_does_not_compare_against_next_knot() {
        // A simple knot followed by a different value must still report 1,
        // and a simple knot before a double knot must not pick up the double.
        let knots = arr1(&[0.0, 0.0, 0.5, 0.7, 0.7, 1.0, 1.0]);
        assert_eq!(knot_multiplicity(knots.view(), 2), 1);
        assert_eq!(knot_multiplicity(knots.view(), 3), 2);
    }

    #[test]
    fn test_knot_multiplicity_with_tol() {
        let noisy = arr1(&[0.0, 0.0, 0.0, 0.5, 0.5 + 1e-12, 1.0, 1.0, 1.0]);
        assert_eq!(knot_multiplicity(noisy.view(), 3), 1);
        assert_eq!(knot_multiplicity_with_tol(noisy.view(), 3, &Tolerances::DEFAULT), 1);
        assert_eq!(knot_multiplicity_with_tol(noisy.view(), 3, &Tolerances::LOOSE), 2);
        assert_eq!(knot_multiplicity_with_tol(noisy.view(), 4, &Tolerances::LOOSE), 2);
        // Agrees with the run lengths of knot_multiplicities
        let runs = knot_multiplicities(noisy.view(), &Tolerances::LOOSE);
        assert_eq!(runs[1].1, knot_multiplicity_with_tol(noisy.view(), 3, &Tolerances::LOOSE));
    }

    #[test]
    fn test_knot_multiplicities() {
        let knots = arr1(&[0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0]);
        let mults = knot_multiplicities(knots.view(), &Tolerances::DEFAULT);
        assert_eq!(mults, vec![(0.0, 3), (0.5, 1), (1.0, 3)]);

        // With a loose tolerance nearly equal knots merge.
        let noisy = arr1(&[0.0, 1e-12, 1.0]);
        assert_eq!(knot_multiplicities(noisy.view(), &Tolerances::DEFAULT).len(), 3);
        assert_eq!(knot_multiplicities(noisy.view(), &Tolerances::LOOSE), vec![(0.0, 2), (1.0, 1)]);
    }

    #[test]
    fn test_clamped_uniform_knots_no_internal() {
        let knots = clamped_uniform_knots(2, 3, 0.0, 1.0).unwrap();
        assert_arr_eq(&knots, &arr1(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]));
    }

    #[test]
    fn test_clamped_uniform_knots_few_internal() {
        // p=1, n=5: 3 internal knots, step = (4-0)/(3+1) = 1
        let knots = clamped_uniform_knots(1, 5, 0.0, 4.0).unwrap();
        assert_arr_eq(&knots, &arr1(&[0.0, 0.0, 1.0, 2.0, 3.0, 4.0, 4.0]));

        let cubic = clamped_uniform_knots(3, 6, 0.0, 1.0).unwrap();
        assert_arr_eq(&cubic, &arr1(&[0.0, 0.0, 0.0, 0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0, 1.0, 1.0, 1.0]));
        assert!(validate_knots(3, cubic.view(), 6).is_ok());
    }

    #[test]
    fn test_clamped_uniform_knots_errors() {
        assert!(matches!(
            clamped_uniform_knots(0, 3, 0.0, 1.0),
            Err(NurbsError::InvalidDegree { degree: 0, .. })
        ));
        // degree must be smaller than the number of control points
        assert!(matches!(
            clamped_uniform_knots(3, 3, 0.0, 1.0),
            Err(NurbsError::TooFewControlPoints { degree: 3, num_control_points: 3 })
        ));
        assert_eq!(
            uniform_knots(1, 1, 0.0, 1.0),
            Err(NurbsError::TooFewControlPoints { degree: 1, num_control_points: 1 })
        );
        assert!(matches!(
            clamped_uniform_knots(10, 20, 0.0, 1.0),
            Err(NurbsError::InvalidDegree { degree: 10, min: 1, max: 9 })
        ));
        assert_eq!(
            clamped_uniform_knots(2, 4, 1.0, 1.0),
            Err(NurbsError::InvalidKnotRange(1.0, 1.0))
        );
        assert!(clamped_uniform_knots(2, 4, 5.0, 1.0).is_err());
    }

    #[test]
    fn test_uniform_knots() {
        // p=2, n=5: 8 knots, domain [knots[2], knots[5]] = [0, 1], step 1/3
        let knots = uniform_knots(2, 5, 0.0, 1.0).unwrap();
        assert_eq!(knots.len(), 8);
        let step = 1.0 / 3.0;
        let expected = Array1::from_iter((0..8).map(|i| (i as f64 - 2.0) * step));
        assert_arr_eq(&knots, &expected);
        assert_eq!(domain(2, knots.view()), (0.0, 1.0));
        assert!(validate_knots(2, knots.view(), 5).is_ok());
    }

    #[test]
    fn test_uniform_knots_errors() {
        assert!(uniform_knots(0, 5, 0.0, 1.0).is_err());
        assert!(uniform_knots(5, 5, 0.0, 1.0).is_err());
        assert!(uniform_knots(2, 5, 2.0, 1.0).is_err());
    }

    #[test]
    fn test_validate_knots_valid() {
        let knots = arr1(&[0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0, 4.0, 4.0]); // n=6, p=2
        assert!(validate_knots(2, knots.view(), 6).is_ok());

        // Interior knot of full multiplicity is allowed here (curve is then discontinuous).
        let repeated = arr1(&[0.0, 0.0, 0.0, 0.5, 0.5, 0.5, 1.0, 1.0, 1.0]);
        assert!(validate_knots(2, repeated.view(), 6).is_ok());
    }

    #[test]
    fn test_validate_knots_invalid_length() {
        let knots = arr1(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        assert_eq!(
            validate_knots(2, knots.view(), 4),
            Err(NurbsError::KnotCountMismatch {
                degree: 2,
                num_control_points: 4,
                expected: 7,
                actual: 6,
            })
        );
    }

    #[test]
    fn test_validate_knots_not_sorted() {
        let knots = arr1(&[0.0, 0.0, 0.0, 2.0, 1.0, 3.0, 4.0, 4.0, 4.0]);
        match validate_knots(2, knots.view(), 6) {
            Err(NurbsError::NonMonotonicKnots { index, value, next_value }) => {
                assert_eq!(index, 3);
                assert_eq!(value, 2.0);
                assert_eq!(next_value, 1.0);
            }
            other => panic!("Expected NonMonotonicKnots, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_knots_rejects_nan() {
        let knots = arr1(&[0.0, 0.0, f64::NAN, 1.0, 1.0, 1.0]);
        assert!(validate_knots(2, knots.view(), 3).is_err());
    }
}
