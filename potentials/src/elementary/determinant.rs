use na::{Matrix3, SMatrix, SVector};
use utils::Real;

use super::{columns3, join3};
use crate::function::Function;
use crate::tensor::HessianTensor;

/// Determinant of a 3×3 matrix given by its 9 column-major entries.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Determinant3;

/// Natural logarithm of the determinant of a 3×3 matrix.
///
/// Valid only for matrices with a positive determinant.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LogDeterminant3;

/// Squared natural logarithm of the determinant of a 3×3 matrix.
///
/// Valid only for matrices with a positive determinant.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LogSquareDeterminant3;

#[inline]
fn determinant<T: Real>(x: &SVector<T, 9>) -> T {
    let [c0, c1, c2] = columns3(x);
    c0.dot(&c1.cross(&c2))
}

/// Gradient of the determinant. Each block is the cross product of the other two columns.
#[inline]
fn determinant_gradient<T: Real>(x: &SVector<T, 9>) -> SVector<T, 9> {
    let [c0, c1, c2] = columns3(x);
    join3([c1.cross(&c2), c2.cross(&c0), c0.cross(&c1)])
}

/// The determinant is linear in each column, so its Hessian has zero diagonal blocks and
/// skew-symmetric off-diagonal blocks.
fn determinant_hessian<T: Real>(x: &SVector<T, 9>) -> SMatrix<T, 9, 9> {
    let [c0, c1, c2] = columns3(x);
    let blocks: [(usize, usize, Matrix3<T>); 3] = [
        (0, 1, -c2.cross_matrix()),
        (0, 2, c1.cross_matrix()),
        (1, 2, -c0.cross_matrix()),
    ];
    let mut h = SMatrix::<T, 9, 9>::zeros();
    for (i, j, block) in blocks {
        h.fixed_view_mut::<3, 3>(3 * i, 3 * j).copy_from(&block);
        h.fixed_view_mut::<3, 3>(3 * j, 3 * i).copy_from(&block.transpose());
    }
    h
}

impl<T: Real> Function<T, 9, 1> for Determinant3 {
    #[inline]
    fn valid_input(&self, _: &SVector<T, 9>) -> bool {
        true
    }
    #[inline]
    fn eval(&self, x: &SVector<T, 9>) -> SVector<T, 1> {
        SVector::from_element(determinant(x))
    }
    #[inline]
    fn jacobian(&self, x: &SVector<T, 9>) -> SMatrix<T, 1, 9> {
        determinant_gradient(x).transpose()
    }
    #[inline]
    fn hessian(&self, x: &SVector<T, 9>) -> HessianTensor<T, 1, 9> {
        HessianTensor::from_matrix(determinant_hessian(x))
    }
}

impl<T: Real> Function<T, 9, 1> for LogDeterminant3 {
    #[inline]
    fn valid_input(&self, x: &SVector<T, 9>) -> bool {
        determinant(x) > T::zero()
    }
    #[inline]
    fn eval(&self, x: &SVector<T, 9>) -> SVector<T, 1> {
        SVector::from_element(determinant(x).ln())
    }
    #[inline]
    fn jacobian(&self, x: &SVector<T, 9>) -> SMatrix<T, 1, 9> {
        (determinant_gradient(x) / determinant(x)).transpose()
    }
    fn hessian(&self, x: &SVector<T, 9>) -> HessianTensor<T, 1, 9> {
        let det = determinant(x);
        let g = determinant_gradient(x);
        let inv = T::one() / det;
        HessianTensor::from_matrix(determinant_hessian(x) * inv - g * g.transpose() * (inv * inv))
    }
}

impl<T: Real> Function<T, 9, 1> for LogSquareDeterminant3 {
    #[inline]
    fn valid_input(&self, x: &SVector<T, 9>) -> bool {
        determinant(x) > T::zero()
    }
    #[inline]
    fn eval(&self, x: &SVector<T, 9>) -> SVector<T, 1> {
        let log_det = determinant(x).ln();
        SVector::from_element(log_det * log_det)
    }
    #[inline]
    fn jacobian(&self, x: &SVector<T, 9>) -> SMatrix<T, 1, 9> {
        let det = determinant(x);
        let two: T = na::convert(2.0);
        (determinant_gradient(x) * (two * det.ln() / det)).transpose()
    }
    fn hessian(&self, x: &SVector<T, 9>) -> HessianTensor<T, 1, 9> {
        let det = determinant(x);
        let log_det = det.ln();
        let g = determinant_gradient(x);
        let two: T = na::convert(2.0);
        let first = two * log_det / det;
        let second = two * (T::one() - log_det) / (det * det);
        HessianTensor::from_matrix(determinant_hessian(x) * first + g * g.transpose() * second)
    }
}
