//! Numeric tolerances used by span location and the closedness checks.

/// Snap distance used when a parameter sits on the first or last knot of the
/// domain. Also used by [`crate::core::basis::one_basis`] for its endpoint case.
pub const SPAN_SNAP_EPSILON: f64 = f64::EPSILON;

/// Maximum difference between two knot spacings that still counts as periodic, relative to
/// the knot range (absolute for ranges shorter than 1).
pub const KNOT_SPACING_EPSILON: f64 = 1e-10;

/// Maximum Euclidean distance between two control points (or two weights) that
/// still counts as coincident when checking closedness.
pub const CLOSED_POINT_TOLERANCE: f64 = 1e-5;

/// Two knot values closer than this are the same knot when counting multiplicity.
pub const KNOT_MULTIPLICITY_EPSILON: f64 = f64::EPSILON;

/// Vectors shorter than this cannot be normalized (tangents, normals, frames).
pub const DEGENERATE_LENGTH: f64 = 1e-12;

/// Tolerances for the geometric predicates in [`crate::core::check`] and
/// [`crate::core::knots`].
///
/// Span snapping is not configurable; [`crate::core::knots::find_span`] always uses
/// [`SPAN_SNAP_EPSILON`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// See [`KNOT_SPACING_EPSILON`].
    pub knot_spacing: f64,
    /// See [`CLOSED_POINT_TOLERANCE`].
    pub closed_point: f64,
    /// See [`KNOT_MULTIPLICITY_EPSILON`].
    pub knot_multiplicity: f64,
}

impl Tolerances {
    pub const DEFAULT: Self = Self {
        knot_spacing: KNOT_SPACING_EPSILON,
        closed_point: CLOSED_POINT_TOLERANCE,
        knot_multiplicity: KNOT_MULTIPLICITY_EPSILON,
    };

    /// Loose preset for data that went through a lossy round trip (e.g. text
    /// serialization with a handful of significant digits).
    pub const LOOSE: Self = Self {
        knot_spacing: 1e-9,
        closed_point: 1e-4,
        knot_multiplicity: 1e-9,
    };
}

impl Default for Tolerances {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_constants() {
        let tol = Tolerances::default();
        assert_eq!(tol, Tolerances::DEFAULT);
        assert_eq!(tol.knot_spacing, KNOT_SPACING_EPSILON);
        assert_eq!(tol.closed_point, 1e-5);
        assert_eq!(tol.knot_multiplicity, KNOT_MULTIPLICITY_EPSILON);
    }

    #[test]
    fn test_loose_is_looser_than_default() {
        let (d, l) = (Tolerances::DEFAULT, Tolerances::LOOSE);
        assert!(l.knot_spacing > d.knot_spacing);
        assert!(l.closed_point > d.closed_point);
        assert!(l.knot_multiplicity > d.knot_multiplicity);
    }
}
