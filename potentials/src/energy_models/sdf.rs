//! Signed distance functions of simple shapes.
//!
//! Each function maps a query point to its signed distance from the surface, negative inside.
//! Derivatives are written out directly with one branch per closest feature.

use na::{Matrix3, SMatrix, SVector, Vector3};
use utils::{min_norm, sign, Real};

use crate::elementary::VecLength;
use crate::function::Function;
use crate::tensor::HessianTensor;

/// Distance to a point at offset `r` from it.
#[inline]
fn point_distance<T: Real>(r: &Vector3<T>) -> T {
    VecLength.eval(r)[0]
}

#[inline]
fn point_distance_jacobian<T: Real>(r: &Vector3<T>) -> SMatrix<T, 1, 3> {
    VecLength.jacobian(r)
}

#[inline]
fn point_distance_hessian<T: Real>(r: &Vector3<T>) -> Matrix3<T> {
    VecLength.hessian(r).into_matrix()
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SphereSdf<T: Real> {
    pub center: Vector3<T>,
    pub radius: T,
}

impl<T: Real> SphereSdf<T> {
    #[inline]
    pub fn new(center: Vector3<T>, radius: T) -> Self {
        SphereSdf { center, radius }
    }
}

impl<T: Real> Function<T, 3, 1> for SphereSdf<T> {
    /// Valid away from the center.
    #[inline]
    fn valid_input(&self, p: &Vector3<T>) -> bool {
        (p - self.center).norm() > min_norm()
    }
    #[inline]
    fn eval(&self, p: &Vector3<T>) -> SVector<T, 1> {
        SVector::from_element(point_distance(&(p - self.center)) - self.radius)
    }
    #[inline]
    fn jacobian(&self, p: &Vector3<T>) -> SMatrix<T, 1, 3> {
        point_distance_jacobian(&(p - self.center))
    }
    #[inline]
    fn hessian(&self, p: &Vector3<T>) -> HessianTensor<T, 1, 3> {
        HessianTensor::from_matrix(point_distance_hessian(&(p - self.center)))
    }
}

/// A line segment from `a` to `b` inflated by `radius`.
///
/// With a zero radius this is the unsigned distance to the segment.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CapsuleSdf<T: Real> {
    pub a: Vector3<T>,
    pub b: Vector3<T>,
    pub radius: T,
}

/// Closest feature of a segment.
enum Segment<T: Real> {
    /// Offset from an endpoint.
    Endpoint(Vector3<T>),
    /// Offset from a point inside the segment and the unit segment direction.
    Interior(Vector3<T>, Vector3<T>),
}

impl<T: Real> CapsuleSdf<T> {
    #[inline]
    pub fn new(a: Vector3<T>, b: Vector3<T>, radius: T) -> Self {
        CapsuleSdf { a, b, radius }
    }

    fn closest(&self, p: &Vector3<T>) -> Segment<T> {
        let ab = self.b - self.a;
        let ap = p - self.a;
        let length = ab.norm();
        if length <= min_norm() {
            return Segment::Endpoint(ap);
        }
        let u = ab / length;
        let t = ap.dot(&u);
        if t <= T::zero() {
            Segment::Endpoint(ap)
        } else if t >= length {
            Segment::Endpoint(p - self.b)
        } else {
            Segment::Interior(ap - u * t, u)
        }
    }
}

impl<T: Real> Function<T, 3, 1> for CapsuleSdf<T> {
    /// Valid away from the segment itself.
    ///
    /// The Hessian jumps across the planes through the endpoints perpendicular to the segment,
    /// so finite differences straddling those planes are not meaningful.
    #[inline]
    fn valid_input(&self, p: &Vector3<T>) -> bool {
        let r = match self.closest(p) {
            Segment::Endpoint(r) | Segment::Interior(r, _) => r,
        };
        r.norm() > min_norm()
    }

    #[inline]
    fn eval(&self, p: &Vector3<T>) -> SVector<T, 1> {
        let r = match self.closest(p) {
            Segment::Endpoint(r) | Segment::Interior(r, _) => r,
        };
        SVector::from_element(point_distance(&r) - self.radius)
    }

    #[inline]
    fn jacobian(&self, p: &Vector3<T>) -> SMatrix<T, 1, 3> {
        let r = match self.closest(p) {
            Segment::Endpoint(r) | Segment::Interior(r, _) => r,
        };
        point_distance_jacobian(&r)
    }

    fn hessian(&self, p: &Vector3<T>) -> HessianTensor<T, 1, 3> {
        match self.closest(p) {
            Segment::Endpoint(r) => HessianTensor::from_matrix(point_distance_hessian(&r)),
            Segment::Interior(r, u) => {
                // Moving along the segment doesn't change the distance.
                let along = u * u.transpose() / r.norm();
                HessianTensor::from_matrix(point_distance_hessian(&r) - along)
            }
        }
    }
}

/// An axis aligned box with the given center and half extent `size` along each axis.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CubeSdf<T: Real> {
    pub center: Vector3<T>,
    pub size: Vector3<T>,
}

impl<T: Real> CubeSdf<T> {
    #[inline]
    pub fn new(center: Vector3<T>, size: Vector3<T>) -> Self {
        CubeSdf { center, size }
    }

    /// Per axis signed distance outside of the slab `|p_i - c_i| <= size_i`.
    #[inline]
    fn slab_violation(&self, p: &Vector3<T>) -> Vector3<T> {
        (p - self.center).abs() - self.size
    }

    /// Offset from the closest point on the box for points outside of it.
    #[inline]
    fn outside_offset(&self, p: &Vector3<T>, violation: &Vector3<T>) -> Vector3<T> {
        (p - self.center).zip_map(violation, |q, v| sign(q) * v.max(T::zero()))
    }
}

impl<T: Real> Function<T, 3, 1> for CubeSdf<T> {
    /// Valid away from the surface, the edges of the outside regions and any point inside that
    /// is equally close to two faces.
    fn valid_input(&self, p: &Vector3<T>) -> bool {
        let violation = self.slab_violation(p);
        let k = violation.imax();
        let max = violation[k];
        if max > T::zero() {
            violation.iter().all(|v| v.abs() > min_norm())
        } else {
            let runner_up = violation[(k + 1) % 3].max(violation[(k + 2) % 3]);
            max < -min_norm::<T>()
                && runner_up < max - min_norm()
                && (p[k] - self.center[k]).abs() > min_norm()
        }
    }

    fn eval(&self, p: &Vector3<T>) -> SVector<T, 1> {
        let violation = self.slab_violation(p);
        let max = violation[violation.imax()];
        let value = if max > T::zero() {
            self.outside_offset(p, &violation).norm()
        } else {
            max
        };
        SVector::from_element(value)
    }

    fn jacobian(&self, p: &Vector3<T>) -> SMatrix<T, 1, 3> {
        let violation = self.slab_violation(p);
        if violation[violation.imax()] > T::zero() {
            point_distance_jacobian(&self.outside_offset(p, &violation))
        } else {
            let k = violation.imax();
            let mut jac = SMatrix::<T, 1, 3>::zeros();
            jac[k] = sign(p[k] - self.center[k]);
            jac
        }
    }

    fn hessian(&self, p: &Vector3<T>) -> HessianTensor<T, 1, 3> {
        let violation = self.slab_violation(p);
        if violation[violation.imax()] > T::zero() {
            let r = self.outside_offset(p, &violation);
            let mut h = point_distance_hessian(&r);
            // The closest point follows the query along axes where it lies within the slab.
            for i in (0..3).filter(|&i| violation[i] <= T::zero()) {
                h[(i, i)] = T::zero();
            }
            HessianTensor::from_matrix(h)
        } else {
            HessianTensor::zeros()
        }
    }
}
