//! Closed-form primitives, each supplying its own derivatives and domain predicate.

mod affine;
mod atan2;
mod determinant;
mod products;
mod vector;

pub use affine::*;
pub use atan2::*;
pub use determinant::*;
pub use products::*;
pub use vector::*;

use na::{SVector, Vector3};
use utils::Real;

/// Split a column-major 3×3 matrix into its columns.
#[inline]
pub(crate) fn columns3<T: Real>(x: &SVector<T, 9>) -> [Vector3<T>; 3] {
    [
        x.fixed_rows::<3>(0).into_owned(),
        x.fixed_rows::<3>(3).into_owned(),
        x.fixed_rows::<3>(6).into_owned(),
    ]
}

/// Join three columns into a column-major 3×3 matrix.
#[inline]
pub(crate) fn join3<T: Real>(c: [Vector3<T>; 3]) -> SVector<T, 9> {
    SVector::from_fn(|r, _| c[r / 3][r % 3])
}

/// Split a stacked pair of 3-vectors.
#[inline]
pub(crate) fn split6<T: Real>(x: &SVector<T, 6>) -> [Vector3<T>; 2] {
    [
        x.fixed_rows::<3>(0).into_owned(),
        x.fixed_rows::<3>(3).into_owned(),
    ]
}
