use thiserror::Error;

/// Reasons a curve, surface or knot vector is rejected by the validity checker
/// or by the knot generators.
///
/// Evaluators never produce this type; they assume their input was validated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NurbsError {
    #[error("Degree must lie in [{min}, {max}], but was {degree}.")]
    InvalidDegree {
        degree: usize,
        min: usize,
        max: usize,
    },

    #[error(
        "Invalid knot vector length for degree {degree} and {num_control_points} control points. Expected {expected}, got {actual}."
    )]
    KnotCountMismatch {
        degree: usize,
        num_control_points: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Degree {degree} needs at least degree + 1 control points, but got {num_control_points}.")]
    TooFewControlPoints {
        degree: usize,
        num_control_points: usize,
    },

    #[error("Knot vector is not non-decreasing: t_{index}={value} > {next_value} (the knot after it).")]
    NonMonotonicKnots {
        index: usize,
        value: f64,
        next_value: f64,
    },

    #[error("Weight array has {weights} entries but there are {control_points} control points.")]
    WeightCountMismatch {
        control_points: usize,
        weights: usize,
    },

    #[error("Weight grid has shape {weights:?} but the control point grid has shape {control_points:?}.")]
    WeightShapeMismatch {
        control_points: (usize, usize),
        weights: (usize, usize),
    },

    #[error("Weight at index {index} must be finite and > 0, but was {value}.")]
    NonPositiveWeight { index: usize, value: f64 },

    #[error("Control net must contain at least one point of dimension >= 1.")]
    EmptyControlNet,

    #[error("Knot range is invalid: start ({0}) must be less than end ({1}).")]
    InvalidKnotRange(f64, f64),
}
