//! Bending across an interior edge shared by two triangles.

use na::{SMatrix, SVector, Vector3};
use utils::Real;

use super::vertex_differences;
use crate::elementary::{
    AffineMap, Atan2, Cross3, Determinant3, Dot3, MultiplyConstant, PlusConstant, SquaredNorm,
    VecNormalized,
};
use crate::function::{Compose, Function, Identity, Stack};
use crate::tensor::HessianTensor;
use crate::Error;

/// `(a, b) -> normalize(a × b)`.
type UnitCross = Compose<Cross3, VecNormalized<3>, 3>;
/// Face normal from the stacked edges `[e0; e1; e2]`.
type FaceNormal<T> = Compose<AffineMap<T, 9, 6>, UnitCross, 6>;
type EdgeDirection<T> = Compose<AffineMap<T, 9, 3>, VecNormalized<3>, 3>;
/// `[n̂0; n̂1; ê0]`
type Frame<T> = Stack<Stack<FaceNormal<T>, FaceNormal<T>, 3, 3, 6>, EdgeDirection<T>, 6, 3, 9>;
/// `(det[n̂0 n̂1 ê0], n̂0 · n̂1)`, which is `(sin θ, cos θ)`.
type SineCosine<T> = Stack<Determinant3, Compose<AffineMap<T, 9, 6>, Dot3, 6>, 1, 1, 2>;
type Angle<T> =
    Compose<Compose<Compose<AffineMap<T, 12, 9>, Frame<T>, 9>, SineCosine<T>, 9>, Atan2, 2>;

/// Signed dihedral angle at an interior edge.
///
/// The input is the stacked positions `[x0; x1; x2; x3]` of the four vertices around the edge:
///
/// ```verbatim
///     x3
///     /\
///    /f1\e2
/// x0/_e0_\x1
///   \    /
///    \f0/e1
///     \/
///     x2
/// ```
///
/// With `e0 = x1 - x0`, `e1 = x2 - x0` and `e2 = x3 - x0`, the face normals are
/// `n0 = e0 × e1` and `n1 = e2 × e0`. The angle is the rotation about `e0` taking `n0` to `n1`,
/// in `(-π, π]`. It is zero when the two faces are coplanar and don't overlap.
///
/// Valid where both faces have nonzero area.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DihedralAngle<T: Real> {
    angle: Angle<T>,
}

impl<T: Real> Default for DihedralAngle<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Real> DihedralAngle<T> {
    pub fn new() -> Self {
        let edges = AffineMap::linear(vertex_differences::<T, 12, 9>(&[(0, 1), (0, 2), (0, 3)]));

        // [e2; e0]
        let swap = AffineMap::linear(SMatrix::<T, 6, 9>::from_fn(|r, c| {
            if (r < 3 && c == r + 6) || (r >= 3 && c + 3 == r) {
                T::one()
            } else {
                T::zero()
            }
        }));
        let n0 = Compose::new(AffineMap::select(0), Compose::new(Cross3, VecNormalized));
        let n1 = Compose::new(swap, Compose::new(Cross3, VecNormalized));
        let e0 = Compose::new(AffineMap::select(0), VecNormalized);
        let frame = Stack::new(Stack::new(n0, n1), e0);

        let sine_cosine = Stack::new(Determinant3, Compose::new(AffineMap::select(0), Dot3));

        DihedralAngle {
            angle: Compose::new(
                Compose::new(Compose::new(edges, frame), sine_cosine),
                Atan2,
            ),
        }
    }
}

impl<T: Real> Function<T, 12, 1> for DihedralAngle<T> {
    #[inline]
    fn valid_input(&self, x: &SVector<T, 12>) -> bool {
        self.angle.valid_input(x)
    }
    #[inline]
    fn eval(&self, x: &SVector<T, 12>) -> SVector<T, 1> {
        self.angle.eval(x)
    }
    #[inline]
    fn jacobian(&self, x: &SVector<T, 12>) -> SMatrix<T, 1, 12> {
        self.angle.jacobian(x)
    }
    #[inline]
    fn hessian(&self, x: &SVector<T, 12>) -> HessianTensor<T, 1, 12> {
        self.angle.hessian(x)
    }
}

/// `θ -> stiffness · (θ - rest_angle)²`
type Penalty<T> = MultiplyConstant<T, Compose<PlusConstant<T, Identity<1>, 1>, SquaredNorm<1>, 1>>;

/// Quadratic bending energy `stiffness · (θ - rest_angle)²` of the dihedral angle `θ` at an
/// interior edge.
///
/// The input layout is the same as for [`DihedralAngle`]. The stiffness defaults to one.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DihedralEnergy<T: Real> {
    energy: Compose<DihedralAngle<T>, Penalty<T>, 1>,
}

impl<T: Real> DihedralEnergy<T> {
    pub fn new(rest_angle: T) -> Self {
        let penalty = MultiplyConstant::new(
            Compose::new(PlusConstant::scalar(Identity, -rest_angle), SquaredNorm),
            T::one(),
        );
        DihedralEnergy {
            energy: Compose::new(DihedralAngle::new(), penalty),
        }
    }

    /// Use the dihedral angle of the given rest configuration as the rest angle.
    pub fn from_rest_positions(rest: &[Vector3<T>; 4]) -> Result<Self, Error> {
        let angle = DihedralAngle::new();
        let x = SVector::<T, 12>::from_fn(|r, _| rest[r / 3][r % 3]);
        if !angle.valid_input(&x) {
            let e0 = rest[1] - rest[0];
            let smaller_face = e0
                .cross(&(rest[2] - rest[0]))
                .norm()
                .min(e0.cross(&(rest[3] - rest[0])).norm());
            let measure = (smaller_face * na::convert::<f64, T>(0.5)).as_f64();
            log::warn!("Degenerate reference face at interior edge with area {:e}", measure);
            return Err(Error::DegenerateReferenceElement { measure });
        }
        Ok(Self::new(angle.eval(&x)[0]))
    }

    pub fn with_stiffness(mut self, stiffness: T) -> Self {
        self.energy.outer.factor = stiffness;
        self
    }

    #[inline]
    pub fn rest_angle(&self) -> T {
        -self.energy.outer.function.inner.offset[0]
    }

    #[inline]
    pub fn stiffness(&self) -> T {
        self.energy.outer.factor
    }
}

impl<T: Real> Function<T, 12, 1> for DihedralEnergy<T> {
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
