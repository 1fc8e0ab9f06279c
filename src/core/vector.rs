//! Small vector helpers for tangents, normals and frames.

use ndarray::{Array1, ArrayView1};

use crate::core::tolerance::DEGENERATE_LENGTH;

pub fn norm(v: ArrayView1<f64>) -> f64 {
    v.dot(&v).sqrt()
}

/// `v / |v|`, or `None` when `|v|` is below [`DEGENERATE_LENGTH`].
pub fn normalized(v: ArrayView1<f64>) -> Option<Array1<f64>> {
    let len = norm(v);
    if len < DEGENERATE_LENGTH || !len.is_finite() {
        None
    } else {
        Some(v.mapv(|x| x / len))
    }
}

/// Cross product of two 3D vectors. Panics if either is not 3D.
pub fn cross(a: ArrayView1<f64>, b: ArrayView1<f64>) -> Array1<f64> {
    Array1::from(vec![
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ])
}
