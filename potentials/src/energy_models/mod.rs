//! Potential energies and geometric quantities assembled from the elementary functions.

pub mod dihedral;
pub mod elasticity;
pub mod fem;
pub mod sdf;

pub use dihedral::*;
pub use elasticity::*;
pub use fem::*;
pub use sdf::*;

use na::SMatrix;
use utils::Real;

/// The linear map taking stacked vertex positions to stacked edge vectors.
///
/// Edge `k` is `x[to] - x[from]` for the `k`-th `(from, to)` pair.
pub(crate) fn vertex_differences<T: Real, const IN: usize, const OUT: usize>(
    edges: &[(usize, usize)],
) -> SMatrix<T, OUT, IN> {
    let mut m = SMatrix::zeros();
    for (k, &(from, to)) in edges.iter().enumerate() {
        for d in 0..3 {
            m[(3 * k + d, 3 * to + d)] += T::one();
            m[(3 * k + d, 3 * from + d)] -= T::one();
        }
    }
    m
}

/// The linear map `[d_0; ..; d_{K-1}] -> [Σ_k d_k m(k, 0); ..]`, i.e. right multiplication of
/// the `3×K` matrix `[d_0 .. d_{K-1}]` by `m`, in stacked column form. `N` must be `3·K`.
pub(crate) fn right_multiply<T: Real, const K: usize, const N: usize>(
    m: &SMatrix<T, K, K>,
) -> SMatrix<T, N, N> {
    SMatrix::from_fn(|r, c| {
        if r % 3 == c % 3 {
            m[(c / 3, r / 3)]
        } else {
            T::zero()
        }
    })
}
