use na::{SMatrix, SVector};
use utils::Real;

use super::split6;
use crate::function::Function;
use crate::tensor::HessianTensor;

/// Cross product `a × b` of two stacked 3-vectors `[a; b]`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Cross3;

/// Dot product `a · b` of two stacked 3-vectors `[a; b]`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Dot3;

/// Nonzero second derivatives of the cross product as `(output, a index, 3 + b index, value)`.
///
/// These are the Levi-Civita symbols `ε_ijk = ∂²(a × b)_i / ∂a_j ∂b_k`. The cross product is
/// bilinear so this table is the complete Hessian at every input.
const CROSS_HESSIAN: [(usize, usize, usize, f64); 6] = [
    (0, 1, 5, 1.0),
    (0, 2, 4, -1.0),
    (1, 2, 3, 1.0),
    (1, 0, 5, -1.0),
    (2, 0, 4, 1.0),
    (2, 1, 3, -1.0),
];

/// Nonzero second derivatives of the dot product, `∂²(a · b) / ∂a_k ∂b_k = 1`.
const DOT_HESSIAN: [(usize, usize, usize, f64); 3] = [(0, 0, 3, 1.0), (0, 1, 4, 1.0), (0, 2, 5, 1.0)];

fn constant_hessian<T: Real, const OUT: usize, const IN: usize, const K: usize>(
    table: &[(usize, usize, usize, f64); K],
) -> HessianTensor<T, OUT, IN> {
    let entries: [(usize, usize, usize, T); K] =
        table.map(|(i, j, k, v)| (i, j, k, na::convert::<f64, T>(v)));
    HessianTensor::from_symmetric_entries(&entries)
}

impl<T: Real> Function<T, 6, 3> for Cross3 {
    #[inline]
    fn valid_input(&self, _: &SVector<T, 6>) -> bool {
        true
    }
    #[inline]
    fn eval(&self, x: &SVector<T, 6>) -> SVector<T, 3> {
        let [a, b] = split6(x);
        a.cross(&b)
    }
    /// `[-[b]×, [a]×]`
    #[inline]
    fn jacobian(&self, x: &SVector<T, 6>) -> SMatrix<T, 3, 6> {
        let [a, b] = split6(x);
        let mut j = SMatrix::<T, 3, 6>::zeros();
        j.fixed_view_mut::<3, 3>(0, 0).copy_from(&-b.cross_matrix());
        j.fixed_view_mut::<3, 3>(0, 3).copy_from(&a.cross_matrix());
        j
    }
    #[inline]
    fn hessian(&self, _: &SVector<T, 6>) -> HessianTensor<T, 3, 6> {
        constant_hessian(&CROSS_HESSIAN)
    }
}

impl<T: Real> Function<T, 6, 1> for Dot3 {
    #[inline]
    fn valid_input(&self, _: &SVector<T, 6>) -> bool {
        true
    }
    #[inline]
    fn eval(&self, x: &SVector<T, 6>) -> SVector<T, 1> {
        let [a, b] = split6(x);
        SVector::from_element(a.dot(&b))
    }
    /// `[bᵗ, aᵗ]`
    #[inline]
    fn jacobian(&self, x: &SVector<T, 6>) -> SMatrix<T, 1, 6> {
        SMatrix::from_fn(|_, c| if c < 3 { x[c + 3] } else { x[c - 3] })
    }
    #[inline]
    fn hessian(&self, _: &SVector<T, 6>) -> HessianTensor<T, 1, 6> {
        constant_hessian(&DOT_HESSIAN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::ScalarFunction;
    use crate::validation::DerivativeCheck;
    use na::{Vector3, Vector6};
    use utils::random_vectors;

    #[test]
    fn cross_values() {
        let x = Vector6::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0);
        assert_eq!(Function::<f64, 6, 3>::eval(&Cross3, &x), Vector3::new(0.0, 0.0, 1.0));
        let j = Function::<f64, 6, 3>::jacobian(&Cross3, &x);
        let a = Vector3::new(1.0, 0.0, 0.0);
        let b = Vector3::new(0.0, 1.0, 0.0);
        // Linear in each argument: J·[da; 0] = da × b and J·[0; db] = a × db.
        let da = Vector3::new(0.2, -0.3, 0.5);
        let dx = Vector6::new(da[0], da[1], da[2], 0.0, 0.0, 0.0);
        assert_eq!(j * dx, da.cross(&b));
        let dx = Vector6::new(0.0, 0.0, 0.0, da[0], da[1], da[2]);
        assert_eq!(j * dx, a.cross(&da));
    }

    #[test]
    fn cross_hessian_is_constant() {
        let samples = random_vectors::<f64, 6>(4, 2.0, 11);
        let h0 = Function::<f64, 6, 3>::hessian(&Cross3, &samples[0]);
        for x in samples.iter().skip(1) {
            assert_eq!(Function::<f64, 6, 3>::hessian(&Cross3, x), h0);
        }
        // Twelve nonzeros: six table entries mirrored across the diagonal.
        let nonzeros = h0.components().iter().flat_map(|m| m.iter()).filter(|&&v| v != 0.0).count();
        assert_eq!(nonzeros, 12);
        assert!(h0.is_symmetric(0.0));
        assert_eq!(h0[(0, 1, 5)], 1.0);
        assert_eq!(h0[(0, 5, 1)], 1.0);
        assert_eq!(h0[(2, 1, 3)], -1.0);
    }

    #[test]
    fn dot_hessian_is_constant() {
        let samples = random_vectors::<f64, 6>(4, 2.0, 12);
        let h0 = Dot3.hessian_matrix(&samples[0]);
        for x in samples.iter().skip(1) {
            assert_eq!(Dot3.hessian_matrix(x), h0);
        }
        let mut expected = SMatrix::<f64, 6, 6>::zeros();
        for k in 0..3 {
            expected[(k, k + 3)] = 1.0;
            expected[(k + 3, k)] = 1.0;
        }
        assert_eq!(h0, expected);
    }

    #[test]
    fn derivatives() {
        let check = DerivativeCheck::for_scalar::<f64>();
        for x in random_vectors::<f64, 6>(5, 2.0, 13) {
            check.check_jacobian(&Cross3, &x).unwrap();
            check.check_hessian(&Cross3, &x).unwrap();
            check.check_jacobian(&Dot3, &x).unwrap();
            check.check_hessian(&Dot3, &x).unwrap();
        }
    }
}
