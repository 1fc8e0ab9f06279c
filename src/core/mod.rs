pub mod basis;
pub mod check;
pub mod curve;
pub mod error;
pub mod homogeneous;
pub mod knots;
pub mod surface;
pub mod tolerance;
pub mod vector;
