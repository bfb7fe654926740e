//! Second derivative tensors and the algebra needed to chain them.

use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Neg, Sub};

use na::{DMatrix, SMatrix, SymmetricEigen};
use utils::Real;

/// Second derivatives of a function `y: R^IN -> R^OUT`.
///
/// This is a stack of `OUT` square `IN×IN` matrices where entry `(i, j, k)` holds
/// `∂²y_i/∂x_j∂x_k`. Mixed partials commute, so each component matrix is expected to be
/// symmetric.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HessianTensor<T: Real, const OUT: usize, const IN: usize> {
    components: [SMatrix<T, IN, IN>; OUT],
}

impl<T: Real, const OUT: usize, const IN: usize> Default for HessianTensor<T, OUT, IN> {
    fn default() -> Self {
        Self::zeros()
    }
}

impl<T: Real, const OUT: usize, const IN: usize> HessianTensor<T, OUT, IN> {
    #[inline]
    pub fn zeros() -> Self {
        HessianTensor {
            components: [SMatrix::zeros(); OUT],
        }
    }

    #[inline]
    pub fn from_components(components: [SMatrix<T, IN, IN>; OUT]) -> Self {
        HessianTensor { components }
    }

    /// Build the tensor component by component.
    #[inline]
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnMut(usize) -> SMatrix<T, IN, IN>,
    {
        HessianTensor {
            components: std::array::from_fn(f),
        }
    }

    /// Build a sparse tensor from a table of `(i, j, k, value)` entries.
    ///
    /// Each entry is written to both `(i, j, k)` and `(i, k, j)`, so only one triangle of
    /// every component needs to be listed.
    pub fn from_symmetric_entries(entries: &[(usize, usize, usize, T)]) -> Self {
        let mut h = Self::zeros();
        for &(i, j, k, v) in entries {
            h[(i, j, k)] = v;
            h[(i, k, j)] = v;
        }
        h
    }

    /// The second derivative matrix of output `i`.
    #[inline]
    pub fn component(&self, i: usize) -> &SMatrix<T, IN, IN> {
        &self.components[i]
    }

    #[inline]
    pub fn components(&self) -> &[SMatrix<T, IN, IN>; OUT] {
        &self.components
    }

    #[inline]
    pub fn into_components(self) -> [SMatrix<T, IN, IN>; OUT] {
        self.components
    }

    /// Mix components with the rows of `a`: `result[i] = Σ_j a(i, j) · self[j]`.
    ///
    /// In the chain rule this pushes the inner function's curvature forward through the outer
    /// function's Jacobian.
    pub fn left_apply<const NEW_OUT: usize>(
        &self,
        a: &SMatrix<T, NEW_OUT, OUT>,
    ) -> HessianTensor<T, NEW_OUT, IN> {
        HessianTensor::from_fn(|i| {
            let mut out = SMatrix::<T, IN, IN>::zeros();
            for (j, h) in self.components.iter().enumerate() {
                let w = a[(i, j)];
                if w != T::zero() {
                    out += h * w;
                }
            }
            out
        })
    }

    /// Change variables in every component: `result[i] = aᵗ · self[i] · a`.
    ///
    /// In the chain rule this pulls the outer function's curvature back through the inner
    /// function's Jacobian.
    pub fn right_sandwich<const NEW_IN: usize>(
        &self,
        a: &SMatrix<T, IN, NEW_IN>,
    ) -> HessianTensor<T, OUT, NEW_IN> {
        HessianTensor::from_fn(|i| a.tr_mul(&(self.components[i] * a)))
    }

    /// Multiply every entry by `s`.
    #[inline]
    pub fn scaled(&self, s: T) -> Self {
        HessianTensor::from_fn(|i| self.components[i] * s)
    }

    /// Largest absolute entry.
    pub fn max_abs(&self) -> T {
        self.components
            .iter()
            .flat_map(|m| m.iter())
            .fold(T::zero(), |acc, &x| acc.max(x.abs()))
    }

    /// Check that every component is symmetric up to an absolute tolerance.
    pub fn is_symmetric(&self, tol: T) -> bool {
        self.components.iter().all(|m| {
            (0..IN).all(|j| (0..j).all(|k| (m[(j, k)] - m[(k, j)]).abs() <= tol))
        })
    }
}

impl<T: Real, const IN: usize> HessianTensor<T, 1, IN> {
    /// The Hessian of a scalar function as a plain matrix.
    #[inline]
    pub fn into_matrix(self) -> SMatrix<T, IN, IN> {
        self.components[0]
    }

    #[inline]
    pub fn from_matrix(m: SMatrix<T, IN, IN>) -> Self {
        HessianTensor { components: [m] }
    }
}

/// Project a symmetric matrix onto the cone of positive semi-definite matrices by clamping
/// negative eigenvalues to zero.
///
/// Newton type solvers use this to turn an indefinite energy Hessian into a usable linear
/// system matrix. The input is assumed symmetric.
pub fn project_spd<T: Real, const N: usize>(m: &SMatrix<T, N, N>) -> SMatrix<T, N, N> {
    let mut eigen = SymmetricEigen::new(DMatrix::from_column_slice(N, N, m.as_slice()));
    eigen.eigenvalues.apply(|v| *v = (*v).max(T::zero()));
    SMatrix::from_column_slice(eigen.recompose().as_slice())
}

impl<T: Real, const OUT: usize, const IN: usize> Index<(usize, usize, usize)>
    for HessianTensor<T, OUT, IN>
{
    type Output = T;
    #[inline]
    fn index(&self, (i, j, k): (usize, usize, usize)) -> &T {
        &self.components[i][(j, k)]
    }
}

impl<T: Real, const OUT: usize, const IN: usize> IndexMut<(usize, usize, usize)>
    for HessianTensor<T, OUT, IN>
{
    #[inline]
    fn index_mut(&mut self, (i, j, k): (usize, usize, usize)) -> &mut T {
        &mut self.components[i][(j, k)]
    }
}

impl<T: Real, const OUT: usize, const IN: usize> Add for HessianTensor<T, OUT, IN> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        HessianTensor::from_fn(|i| self.components[i] + rhs.components[i])
    }
}

impl<T: Real, const OUT: usize, const IN: usize> AddAssign for HessianTensor<T, OUT, IN> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.components.iter_mut().zip(rhs.components.iter()) {
            *a += b;
        }
    }
}

impl<T: Real, const OUT: usize, const IN: usize> Sub for HessianTensor<T, OUT, IN> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        HessianTensor::from_fn(|i| self.components[i] - rhs.components[i])
    }
}

impl<T: Real, const OUT: usize, const IN: usize> Neg for HessianTensor<T, OUT, IN> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        HessianTensor::from_fn(|i| -self.components[i])
    }
}

impl<T: Real, const OUT: usize, const IN: usize> Mul<T> for HessianTensor<T, OUT, IN> {
    type Output = Self;
    #[inline]
    fn mul(self, s: T) -> Self {
        self.scaled(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use na::{Matrix2, Matrix3, Matrix3x2};

    fn sample() -> HessianTensor<f64, 2, 3> {
        HessianTensor::from_components([
            Matrix3::new(1.0, 2.0, 3.0, 2.0, 4.0, 5.0, 3.0, 5.0, 6.0),
            Matrix3::new(-1.0, 0.5, 0.0, 0.5, 2.0, 1.0, 0.0, 1.0, 0.0),
        ])
    }

    #[test]
    fn default_is_zero() {
        let h = HessianTensor::<f64, 3, 4>::default();
        assert_eq!(h.max_abs(), 0.0);
        assert_eq!(h, HessianTensor::zeros());
    }

    #[test]
    fn indexing() {
        let mut h = sample();
        assert_eq!(h[(0, 1, 2)], 5.0);
        assert_eq!(h[(1, 0, 1)], 0.5);
        h[(1, 2, 2)] = 7.0;
        assert_eq!(h.component(1)[(2, 2)], 7.0);
    }

    #[test]
    fn symmetric_entries() {
        let h = HessianTensor::<f64, 2, 3>::from_symmetric_entries(&[(0, 0, 2, 1.0), (1, 1, 1, -2.0)]);
        assert_eq!(h[(0, 0, 2)], 1.0);
        assert_eq!(h[(0, 2, 0)], 1.0);
        assert_eq!(h[(1, 1, 1)], -2.0);
        assert_eq!(h[(0, 1, 1)], 0.0);
        assert!(h.is_symmetric(0.0));
    }

    #[test]
    fn left_apply_mixes_components() {
        let h = sample();
        let a = Matrix3x2::new(1.0, 0.0, 0.0, 1.0, 2.0, -3.0);
        let r = h.left_apply(&a);
        assert_eq!(*r.component(0), *h.component(0));
        assert_eq!(*r.component(1), *h.component(1));
        assert_relative_eq!(
            *r.component(2),
            h.component(0) * 2.0 - h.component(1) * 3.0
        );

        let identity = na::Matrix2::identity();
        assert_eq!(h.left_apply(&identity), h);
    }

    #[test]
    fn right_sandwich_changes_variables() {
        let h = sample();
        let a = Matrix3x2::new(1.0, 2.0, 0.0, -1.0, 3.0, 1.0);
        let r = h.right_sandwich(&a);
        for i in 0..2 {
            let expected: Matrix2<f64> = a.transpose() * h.component(i) * a;
            assert_relative_eq!(*r.component(i), expected, epsilon = 1e-12);
        }
        assert!(r.is_symmetric(1e-12));
        assert_eq!(h.right_sandwich(&Matrix3::identity()), h);
    }

    #[test]
    fn right_sandwich_of_rank_one_map() {
        // x = t * v maps a single parameter onto a line, so the pulled back curvature is vᵗHv.
        let h = sample();
        let v = na::Vector3::new(1.0, -1.0, 2.0);
        let r = h.right_sandwich(&v);
        assert_relative_eq!(r[(0, 0, 0)], v.dot(&(h.component(0) * v)));
    }

    #[test]
    fn arithmetic() {
        let h = sample();
        let sum = h + h;
        assert_eq!(sum, h * 2.0);
        assert_eq!(sum - h, h);
        assert_eq!(-h + h, HessianTensor::zeros());
        let mut acc = HessianTensor::zeros();
        acc += h;
        acc += h.scaled(0.5);
        assert_relative_eq!(*acc.component(0), h.component(0) * 1.5);
        assert_eq!(h.max_abs(), 6.0);
    }

    #[test]
    fn asymmetry_is_detected() {
        let mut h = sample();
        assert!(h.is_symmetric(0.0));
        h[(0, 0, 1)] += 1e-3;
        assert!(!h.is_symmetric(1e-6));
        assert!(h.is_symmetric(1e-2));
    }

    #[test]
    fn spd_projection() {
        let m = Matrix2::new(1.0, 2.0, 2.0, 1.0); // eigenvalues 3 and -1
        let p = project_spd(&m);
        let eigen = SymmetricEigen::new(p);
        assert!(eigen.eigenvalues.iter().all(|&v| v > -1e-12));
        assert_relative_eq!(p, Matrix2::new(1.5, 1.5, 1.5, 1.5), epsilon = 1e-12);

        let spd = Matrix3::new(2.0, 0.5, 0.0, 0.5, 1.0, 0.0, 0.0, 0.0, 3.0);
        assert_relative_eq!(project_spd(&spd), spd, epsilon = 1e-12);
    }
}
