use na::{SMatrix, SVector};
use utils::{min_norm, Real};

use crate::function::Function;
use crate::tensor::HessianTensor;

/// Signed angle `atan2(y, x)` of the input `(y, x)`.
///
/// Valid where `|(y, x)|` exceeds `100·eps`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Atan2;

impl<T: Real> Function<T, 2, 1> for Atan2 {
    #[inline]
    fn valid_input(&self, v: &SVector<T, 2>) -> bool {
        v.norm() > min_norm()
    }
    #[inline]
    fn eval(&self, v: &SVector<T, 2>) -> SVector<T, 1> {
        SVector::from_element(v[0].atan2(v[1]))
    }
    #[inline]
    fn jacobian(&self, v: &SVector<T, 2>) -> SMatrix<T, 1, 2> {
        let (y, x) = (v[0], v[1]);
        let r2 = v.norm_squared();
        SMatrix::<T, 1, 2>::new(x / r2, -y / r2)
    }
    fn hessian(&self, v: &SVector<T, 2>) -> HessianTensor<T, 1, 2> {
        let (y, x) = (v[0], v[1]);
        let r2 = v.norm_squared();
        let r4 = r2 * r2;
        let two: T = na::convert(2.0);
        let yy = -two * x * y / r4;
        let xy = (y * y - x * x) / r4;
        HessianTensor::from_matrix(SMatrix::<T, 2, 2>::new(yy, xy, xy, -yy))
    }
}
