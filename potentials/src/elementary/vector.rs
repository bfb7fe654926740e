use na::{SMatrix, SVector};
use utils::{min_norm, Real};

use crate::function::Function;
use crate::tensor::HessianTensor;

/// Euclidean length of a vector in `R^N`.
///
/// Valid where the length exceeds `100·eps`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct VecLength<const N: usize>;

/// Unit vector in the direction of a vector in `R^N`.
///
/// Valid where the length exceeds `100·eps`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct VecNormalized<const N: usize>;

/// Squared Euclidean length of a vector in `R^N`. Defined everywhere.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SquaredNorm<const N: usize>;

/// `(I - uuᵗ) / |v|` for `u = v / |v|`. This is both the Hessian of the length and the
/// Jacobian of the normalization.
#[inline]
fn tangent_projector<T: Real, const N: usize>(v: &SVector<T, N>) -> SMatrix<T, N, N> {
    let norm = v.norm();
    let u = v / norm;
    (SMatrix::<T, N, N>::identity() - u * u.transpose()) / norm
}

impl<T: Real, const N: usize> Function<T, N, 1> for VecLength<N> {
    #[inline]
    fn valid_input(&self, x: &SVector<T, N>) -> bool {
        x.norm() > min_norm()
    }
    #[inline]
    fn eval(&self, x: &SVector<T, N>) -> SVector<T, 1> {
        SVector::from_element(x.norm())
    }
    #[inline]
    fn jacobian(&self, x: &SVector<T, N>) -> SMatrix<T, 1, N> {
        (x / x.norm()).transpose()
    }
    #[inline]
    fn hessian(&self, x: &SVector<T, N>) -> HessianTensor<T, 1, N> {
        HessianTensor::from_matrix(tangent_projector(x))
    }
}

impl<T: Real, const N: usize> Function<T, N, N> for VecNormalized<N> {
    #[inline]
    fn valid_input(&self, x: &SVector<T, N>) -> bool {
        x.norm() > min_norm()
    }
    #[inline]
    fn eval(&self, x: &SVector<T, N>) -> SVector<T, N> {
        x / x.norm()
    }
    #[inline]
    fn jacobian(&self, x: &SVector<T, N>) -> SMatrix<T, N, N> {
        tangent_projector(x)
    }

    /// Component `i` is `(3·u_i·uuᵗ - u_i·I - e_i·uᵗ - u·e_iᵗ) / |v|²`.
    fn hessian(&self, x: &SVector<T, N>) -> HessianTensor<T, N, N> {
        let norm_squared = x.norm_squared();
        let u = x / norm_squared.sqrt();
        let three: T = na::convert(3.0);
        let uut = u * u.transpose();
        HessianTensor::from_fn(|i| {
            let ui = u[i];
            let mut h = uut * (three * ui) - SMatrix::<T, N, N>::identity() * ui;
            for k in 0..N {
                h[(i, k)] -= u[k];
                h[(k, i)] -= u[k];
            }
            h / norm_squared
        })
    }
}

impl<T: Real, const N: usize> Function<T, N, 1> for SquaredNorm<N> {
    #[inline]
    fn valid_input(&self, _: &SVector<T, N>) -> bool {
        true
    }
    #[inline]
    fn eval(&self, x: &SVector<T, N>) -> SVector<T, 1> {
        SVector::from_element(x.norm_squared())
    }
    #[inline]
    fn jacobian(&self, x: &SVector<T, N>) -> SMatrix<T, 1, N> {
        (x * na::convert::<f64, T>(2.0)).transpose()
    }
    #[inline]
    fn hessian(&self, _: &SVector<T, N>) -> HessianTensor<T, 1, N> {
        HessianTensor::from_matrix(SMatrix::<T, N, N>::identity() * na::convert::<f64, T>(2.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::ScalarFunction;
    use crate::validation::DerivativeCheck;
    use approx::assert_relative_eq;
    use na::{Vector2, Vector3, Vector4};

    #[test]
    fn length_and_direction() {
        let v = Vector3::new(3.0, 0.0, 4.0);
        assert_eq!(VecLength::<3>.value(&v), 5.0);
        assert_eq!(
            Function::<f64, 3, 3>::eval(&VecNormalized::<3>, &v),
            Vector3::new(0.6, 0.0, 0.8)
        );
        assert_eq!(SquaredNorm::<3>.value(&v), 25.0);
    }

    #[test]
    fn normalization_jacobian_annihilates_direction() {
        let v = Vector4::new(0.3, -1.0, 2.0, 0.5);
        let j = Function::<f64, 4, 4>::jacobian(&VecNormalized::<4>, &v);
        assert_relative_eq!((j * v).norm(), 0.0, epsilon = 1e-14);
        assert_relative_eq!(j, j.transpose());
    }

    #[test]
    fn domain() {
        let tiny = Vector2::new(1e-7, 0.0);
        assert!(!Function::<f64, 2, 1>::valid_input(&VecLength::<2>, &tiny));
        assert!(!Function::<f64, 2, 2>::valid_input(&VecNormalized::<2>, &tiny));
        assert!(Function::<f64, 2, 1>::valid_input(&SquaredNorm::<2>, &tiny));
        // Single precision thresholds are much looser.
        let small = Vector2::new(1e-3_f32, 0.0);
        assert!(!Function::<f32, 2, 1>::valid_input(&VecLength::<2>, &small));
        let fine = Vector2::new(1e-1_f32, 0.0);
        assert!(Function::<f32, 2, 1>::valid_input(&VecLength::<2>, &fine));
    }

    #[test]
    fn derivatives() {
        let check = DerivativeCheck::for_scalar::<f64>();
        let v3 = Vector3::new(0.3, -1.2, 0.7);
        let v4 = Vector4::new(0.3, -1.0, 2.0, 0.5);
        check.check_jacobian(&VecLength::<3>, &v3).unwrap();
        check.check_hessian(&VecLength::<3>, &v3).unwrap();
        check.check_jacobian(&VecNormalized::<3>, &v3).unwrap();
        check.check_hessian(&VecNormalized::<3>, &v3).unwrap();
        check.check_jacobian(&VecNormalized::<4>, &v4).unwrap();
        check.check_hessian(&VecNormalized::<4>, &v4).unwrap();
        check.check_jacobian(&SquaredNorm::<4>, &v4).unwrap();
        check.check_hessian(&SquaredNorm::<4>, &v4).unwrap();
    }

    #[test]
    fn normalized_hessian_is_symmetric() {
        let v = Vector4::new(0.3, -1.0, 2.0, 0.5);
        let h = Function::<f64, 4, 4>::hessian(&VecNormalized::<4>, &v);
        assert!(h.is_symmetric(1e-14));
    }
}
