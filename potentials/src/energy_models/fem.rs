//! Deformation gradients of linear finite elements.

use na::{Matrix2, Matrix3, SMatrix, SVector, Vector3};
use utils::{min_norm, Real};

use super::{right_multiply, vertex_differences};
use crate::elementary::{AffineMap, Cross3, VecNormalized};
use crate::function::{Compose, Function, Identity, Stack};
use crate::tensor::HessianTensor;
use crate::Error;

/// Deformation gradient `F = Ds · Dm⁻¹` of a linear tetrahedron.
///
/// The input is the stacked vertex positions `[x0; x1; x2; x3]` and the output is `F` in column
/// major order. `Ds = [x1 - x0, x2 - x0, x3 - x0]` is the deformed shape matrix and `Dm⁻¹` is the
/// inverse of the same matrix at rest, so the whole map is linear in the vertices.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FemTetrahedronDeformationGradient<T: Real> {
    rest_inv: Matrix3<T>,
    map: AffineMap<T, 12, 9>,
}

impl<T: Real> FemTetrahedronDeformationGradient<T> {
    /// Build the map from the inverse rest shape matrix `Dm⁻¹`.
    pub fn new(rest_inv: Matrix3<T>) -> Self {
        let edges = vertex_differences::<T, 12, 9>(&[(0, 1), (0, 2), (0, 3)]);
        let map = AffineMap::linear(right_multiply::<T, 3, 9>(&rest_inv) * edges);
        FemTetrahedronDeformationGradient { rest_inv, map }
    }

    /// Build the map from the rest positions of the four vertices.
    ///
    /// Fails for rest shapes with (nearly) zero volume.
    pub fn from_rest_positions(rest: &[Vector3<T>; 4]) -> Result<Self, Error> {
        let dm = Matrix3::from_columns(&[rest[1] - rest[0], rest[2] - rest[0], rest[3] - rest[0]]);
        let det = dm.determinant();
        let scale = dm
            .column_iter()
            .fold(T::zero(), |acc, c| acc.max(c.norm()));
        let degenerate = || {
            let measure = (det / na::convert::<f64, T>(6.0)).as_f64();
            log::warn!("Degenerate reference tetrahedron with volume {:e}", measure);
            Error::DegenerateReferenceElement { measure }
        };
        if det.abs() <= T::eps() * scale * scale * scale {
            return Err(degenerate());
        }
        let rest_inv = dm.try_inverse().ok_or_else(degenerate)?;
        Ok(Self::new(rest_inv))
    }

    #[inline]
    pub fn rest_inv(&self) -> &Matrix3<T> {
        &self.rest_inv
    }

    /// Unsigned volume of the rest shape.
    pub fn rest_volume(&self) -> T {
        T::one() / (na::convert::<f64, T>(6.0) * self.rest_inv.determinant().abs())
    }
}

impl<T: Real> Function<T, 12, 9> for FemTetrahedronDeformationGradient<T> {
    #[inline]
    fn valid_input(&self, _: &SVector<T, 12>) -> bool {
        true
    }
    #[inline]
    fn eval(&self, x: &SVector<T, 12>) -> SVector<T, 9> {
        self.map.eval(x)
    }
    #[inline]
    fn jacobian(&self, x: &SVector<T, 12>) -> SMatrix<T, 9, 12> {
        self.map.jacobian(x)
    }
    #[inline]
    fn hessian(&self, _: &SVector<T, 12>) -> HessianTensor<T, 9, 12> {
        HessianTensor::zeros()
    }
}

/// `[f0; f1] -> [f0; f1; normalize(f0 × f1)]`.
type LiftWithNormal = Stack<Identity<6>, Compose<Cross3, VecNormalized<3>, 3>, 6, 3, 9>;

/// Deformation gradient of a linear triangle embedded in 3D.
///
/// The input is the stacked vertex positions `[x0; x1; x2]`. The in-plane gradient
/// `[f0 f1] = [x1 - x0, x2 - x0] · Dm⁻¹` is a `3×2` matrix, which is completed to a `3×3` matrix
/// with the unit normal `normalize(f0 × f1)` as the third column. At rest this produces a
/// rotation, so volumetric energies vanish there.
///
/// Valid where the deformed triangle has nonzero area.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FemTriangleDeformationGradient<T: Real> {
    rest_inv: Matrix2<T>,
    gradient: Compose<AffineMap<T, 9, 6>, LiftWithNormal, 6>,
}

impl<T: Real> FemTriangleDeformationGradient<T> {
    /// Build the map from the inverse of the `2×2` rest shape matrix expressed in a local
    /// frame of the rest triangle.
    pub fn new(rest_inv: Matrix2<T>) -> Self {
        let edges = vertex_differences::<T, 9, 6>(&[(0, 1), (0, 2)]);
        let in_plane = AffineMap::linear(right_multiply::<T, 2, 6>(&rest_inv) * edges);
        let lift = Stack::new(Identity, Compose::new(Cross3, VecNormalized));
        FemTriangleDeformationGradient {
            rest_inv,
            gradient: Compose::new(in_plane, lift),
        }
    }

    /// Build the map from the rest positions of the three vertices.
    ///
    /// The local frame has its first axis along `X1 - X0` and its second axis in the plane of
    /// the triangle. Fails for rest shapes with (nearly) zero area.
    pub fn from_rest_positions(rest: &[Vector3<T>; 3]) -> Result<Self, Error> {
        let e0 = rest[1] - rest[0];
        let e1 = rest[2] - rest[0];
        let n = e0.cross(&e1);
        let len0 = e0.norm();
        let scale = len0.max(e1.norm());
        let degenerate = || {
            let measure = (n.norm() * na::convert::<f64, T>(0.5)).as_f64();
            log::warn!("Degenerate reference triangle with area {:e}", measure);
            Error::DegenerateReferenceElement { measure }
        };
        if len0 <= min_norm() || n.norm() <= T::eps() * scale * scale {
            return Err(degenerate());
        }
        let u = e0 / len0;
        let v = n.normalize().cross(&u);
        let dm = Matrix2::new(len0, e1.dot(&u), T::zero(), e1.dot(&v));
        let rest_inv = dm.try_inverse().ok_or_else(degenerate)?;
        Ok(Self::new(rest_inv))
    }

    #[inline]
    pub fn rest_inv(&self) -> &Matrix2<T> {
        &self.rest_inv
    }

    /// Area of the rest shape.
    pub fn rest_area(&self) -> T {
        T::one() / (na::convert::<f64, T>(2.0) * self.rest_inv.determinant().abs())
    }
}

impl<T: Real> Function<T, 9, 9> for FemTriangleDeformationGradient<T> {
    #[inline]
    fn valid_input(&self, x: &SVector<T, 9>) -> bool {
        self.gradient.valid_input(x)
    }
    #[inline]
    fn eval(&self, x: &SVector<T, 9>) -> SVector<T, 9> {
        self.gradient.eval(x)
    }
    #[inline]
    fn jacobian(&self, x: &SVector<T, 9>) -> SMatrix<T, 9, 9> {
        self.gradient.jacobian(x)
    }
    #[inline]
    fn hessian(&self, x: &SVector<T, 9>) -> HessianTensor<T, 9, 9> {
        self.gradient.hessian(x)
    }
}
