//! Neo-Hookean elasticity for tetrahedra and triangles.

use na::{SMatrix, SVector, Vector3};
use serde::{Deserialize, Serialize};
use utils::Real;

use super::fem::{FemTetrahedronDeformationGradient, FemTriangleDeformationGradient};
use crate::elementary::{LogDeterminant3, LogSquareDeterminant3, MultiplyConstant};
use crate::function::{Compose, Function};
use crate::tensor::HessianTensor;
use crate::Error;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElasticityParameters {
    /// First Lame parameter. Measured in Pa = N/m² = kg/(ms²).
    pub lambda: f64,
    /// Second Lame parameter. Measured in Pa = N/m² = kg/(ms²).
    pub mu: f64,
}

impl ElasticityParameters {
    pub fn scaled(self, scale: f64) -> ElasticityParameters {
        ElasticityParameters {
            lambda: self.lambda * scale,
            mu: self.mu * scale,
        }
    }

    /// Rescale parameters uniformly to be closer to 1.0.
    ///
    /// Returns the scale that was applied.
    pub fn normalize(&mut self) -> f64 {
        let scale = if self.mu > 0.0 {
            1.0 / self.mu
        } else if self.lambda > 0.0 {
            1.0 / self.lambda
        } else {
            1.0
        };
        *self = self.scaled(scale);
        scale
    }

    /// Bulk modulus measures the material's resistance to expansion and compression, i.e. its
    /// incompressibility. Shear modulus measures the material's resistance to shear
    /// deformation.
    pub fn from_bulk_shear(bulk: f64, shear: f64) -> Self {
        ElasticityParameters {
            lambda: bulk - 2.0 * shear / 3.0,
            mu: shear,
        }
    }

    pub fn from_young_poisson(young: f64, poisson: f64) -> Self {
        ElasticityParameters {
            lambda: young * poisson / ((1.0 + poisson) * (1.0 - 2.0 * poisson)),
            mu: young / (2.0 * (1.0 + poisson)),
        }
    }

    /// Check that the parameters describe a usable material.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.mu.is_finite() && self.mu >= 0.0) {
            return Err(Error::InvalidParameter { name: "mu" });
        }
        if !self.lambda.is_finite() {
            return Err(Error::InvalidParameter { name: "lambda" });
        }
        Ok(())
    }
}

/// Compressible Neo-Hookean energy density of a deformation gradient `F`:
///
/// `Ψ(F) = ½μ(tr(FᵗF) - 3) - μ log J + ½λ (log J)²`, where `J = det F`.
///
/// The input is `F` in column major order. Valid where `J > 0`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ElasticNeoHookean<T: Real> {
    pub mu: T,
    pub lambda: T,
}

impl<T: Real> ElasticNeoHookean<T> {
    #[inline]
    pub fn new(mu: T, lambda: T) -> Self {
        ElasticNeoHookean { mu, lambda }
    }

    pub fn from_parameters(params: &ElasticityParameters) -> Self {
        ElasticNeoHookean::new(na::convert(params.mu), na::convert(params.lambda))
    }
}

impl<T: Real> Function<T, 9, 1> for ElasticNeoHookean<T> {
    #[inline]
    fn valid_input(&self, x: &SVector<T, 9>) -> bool {
        LogDeterminant3.valid_input(x)
    }

    fn eval(&self, x: &SVector<T, 9>) -> SVector<T, 1> {
        let half: T = na::convert(0.5);
        let three: T = na::convert(3.0);
        let stretch = x.norm_squared() - three;
        let value = half * self.mu * stretch - LogDeterminant3.eval(x)[0] * self.mu
            + half * self.lambda * LogSquareDeterminant3.eval(x)[0];
        SVector::from_element(value)
    }

    fn jacobian(&self, x: &SVector<T, 9>) -> SMatrix<T, 1, 9> {
        let half: T = na::convert(0.5);
        // The Frobenius term is differentiated directly.
        x.transpose() * self.mu - LogDeterminant3.jacobian(x) * self.mu
            + LogSquareDeterminant3.jacobian(x) * (half * self.lambda)
    }

    fn hessian(&self, x: &SVector<T, 9>) -> HessianTensor<T, 1, 9> {
        let half: T = na::convert(0.5);
        HessianTensor::from_matrix(SMatrix::<T, 9, 9>::identity() * self.mu)
            - LogDeterminant3.hessian(x) * self.mu
            + LogSquareDeterminant3.hessian(x) * (half * self.lambda)
    }
}

type TetEnergy<T> =
    Compose<FemTetrahedronDeformationGradient<T>, MultiplyConstant<T, ElasticNeoHookean<T>>, 9>;
type TriEnergy<T> =
    Compose<FemTriangleDeformationGradient<T>, MultiplyConstant<T, ElasticNeoHookean<T>>, 9>;

/// Neo-Hookean elastic energy of a single tetrahedron as a function of its stacked vertex
/// positions `[x0; x1; x2; x3]`.
///
/// This is the energy density integrated over the rest volume.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TetNeoHookeanEnergy<T: Real> {
    energy: TetEnergy<T>,
}

impl<T: Real> TetNeoHookeanEnergy<T> {
    pub fn new(
        deformation_gradient: FemTetrahedronDeformationGradient<T>,
        model: ElasticNeoHookean<T>,
    ) -> Self {
        let volume = deformation_gradient.rest_volume();
        TetNeoHookeanEnergy {
            energy: Compose::new(deformation_gradient, MultiplyConstant::new(model, volume)),
        }
    }

    pub fn from_rest_positions(
        rest: &[Vector3<T>; 4],
        params: &ElasticityParameters,
    ) -> Result<Self, Error> {
        params.validate()?;
        let deformation_gradient = FemTetrahedronDeformationGradient::from_rest_positions(rest)?;
        Ok(Self::new(
            deformation_gradient,
            ElasticNeoHookean::from_parameters(params),
        ))
    }

    #[inline]
    pub fn rest_volume(&self) -> T {
        self.energy.outer.factor
    }

    #[inline]
    pub fn deformation_gradient(&self) -> &FemTetrahedronDeformationGradient<T> {
        &self.energy.inner
    }
}

impl<T: Real> Function<T, 12, 1> for TetNeoHookeanEnergy<T> {
    #[inline]
    fn valid_input(&self, x: &SVector<T, 12>) -> bool {
        self.energy.valid_input(x)
    }
    #[inline]
    fn eval(&self, x: &SVector<T, 12>) -> SVector<T, 1> {
        self.energy.eval(x)
    }
    #[inline]
    fn jacobian(&self, x: &SVector<T, 12>) -> SMatrix<T, 1, 12> {
        self.energy.jacobian(x)
    }
    #[inline]
    fn hessian(&self, x: &SVector<T, 12>) -> HessianTensor<T, 1, 12> {
        self.energy.hessian(x)
    }
}

/// Neo-Hookean membrane energy of a single triangle as a function of its stacked vertex
/// positions `[x0; x1; x2]`.
///
/// The in-plane deformation gradient is completed with the unit normal, so the energy
/// penalizes stretching and shearing within the surface only. It is integrated over the rest
/// area.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TriNeoHookeanEnergy<T: Real> {
    energy: TriEnergy<T>,
}

impl<T: Real> TriNeoHookeanEnergy<T> {
    pub fn new(
        deformation_gradient: FemTriangleDeformationGradient<T>,
        model: ElasticNeoHookean<T>,
    ) -> Self {
        let area = deformation_gradient.rest_area();
        TriNeoHookeanEnergy {
            energy: Compose::new(deformation_gradient, MultiplyConstant::new(model, area)),
        }
    }

    pub fn from_rest_positions(
        rest: &[Vector3<T>; 3],
        params: &ElasticityParameters,
    ) -> Result<Self, Error> {
        params.validate()?;
        let deformation_gradient = FemTriangleDeformationGradient::from_rest_positions(rest)?;
        Ok(Self::new(
            deformation_gradient,
            ElasticNeoHookean::from_parameters(params),
        ))
    }

    #[inline]
    pub fn rest_area(&self) -> T {
        self.energy.outer.factor
    }

    #[inline]
    pub fn deformation_gradient(&self) -> &FemTriangleDeformationGradient<T> {
        &self.energy.inner
    }
}

impl<T: Real> Function<T, 9, 1> for TriNeoHookeanEnergy<T> {
    #[inline]
    fn valid_input(&self, x: &SVector<T, 9>) -> bool {
        self.energy.valid_input(x)
    }
    #[inline]
    fn eval(&self, x: &SVector<T, 9>) -> SVector<T, 1> {
        self.energy.eval(x)
    }
    #[inline]
    fn jacobian(&self, x: &SVector<T, 9>) -> SMatrix<T, 1, 9> {
        self.energy.jacobian(x)
    }
    #[inline]
    fn hessian(&self, x: &SVector<T, 9>) -> HessianTensor<T, 1, 9> {
        self.energy.hessian(x)
    }
}
