//! Evaluation core for NURBS curves and surfaces.
//!
//! Knot span location, B-spline basis functions and their derivatives, and
//! point/derivative evaluation of plain and rational curves and surfaces.
//! Inputs are plain `ndarray` containers; nothing here renders or does I/O.

pub mod core;

pub use crate::core::basis::{basis_derivatives, basis_functions, one_basis};
pub use crate::core::check::{
    curve_is_closed, curve_is_valid, surface_is_closed_u, surface_is_closed_v, surface_is_valid,
};
pub use crate::core::curve::{curve_derivatives, curve_point, curve_tangent, Curve, CurveFrame};
pub use crate::core::error::NurbsError;
pub use crate::core::knots::{find_span, knot_multiplicities, knot_multiplicity, knot_multiplicity_with_tol};
pub use crate::core::surface::{surface_derivatives, surface_normal, surface_point, surface_tangent, Surface};
pub use crate::core::tolerance::Tolerances;
