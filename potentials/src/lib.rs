//! Analytic potential energies assembled from twice differentiable building blocks.
//!
//! Every building block implements [`Function`], which supplies a value, an exact Jacobian and
//! an exact [`HessianTensor`]. Blocks are combined statically with [`Compose`] and [`Stack`], so
//! a composite energy is a single monomorphized type with no runtime graph.

pub mod elementary;
pub mod energy_models;
pub mod function;
pub mod tensor;
pub mod validation;

pub use function::{Compose, Function, Identity, ScalarFunction, Stack};
pub use tensor::{project_spd, HessianTensor};
pub use utils::Real;

use thiserror::Error;

use validation::DerivativeKind;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum Error {
    #[error("Degenerate reference element detected (signed measure {measure:e})")]
    DegenerateReferenceElement { measure: f64 },
    #[error("Invalid parameter: {name}")]
    InvalidParameter { name: &'static str },
    #[error("Input is outside of the function domain")]
    InvalidInput,
    /// Both neighbours of a finite difference stencil are outside the function domain.
    #[error("Finite difference along coordinate {coordinate} leaves the function domain")]
    DifferenceOutsideDomain { coordinate: usize },
    /// An analytic derivative disagrees with its finite difference approximation.
    #[error(
        "{kind} mismatch at {index:?}: analytic {analytic:e}, finite difference {approximate:e}"
    )]
    DerivativeMismatch {
        kind: DerivativeKind,
        /// `[output, input]` for Jacobians and `[output, row, col]` for Hessians.
        index: Vec<usize>,
        analytic: f64,
        approximate: f64,
    },
    /// Two execution targets produced different results for the same sample.
    #[error("{kind} mismatch between execution targets at sample {sample}: {difference:e}")]
    TargetMismatch {
        kind: DerivativeKind,
        sample: usize,
        difference: f64,
    },
}
