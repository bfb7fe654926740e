#![allow(dead_code)]

use na::{SVector, Vector3};
use potentials::energy_models::ElasticityParameters;
use potentials::Real;

pub fn init_logger() {
    let _ = env_logger::Builder::from_env("POTENTIALS_LOG")
        .is_test(true)
        .try_init();
}

pub fn stack<T: Real, const N: usize, const M: usize>(verts: &[Vector3<T>; N]) -> SVector<T, M> {
    SVector::from_fn(|r, _| verts[r / 3][r % 3])
}

pub fn vec3<T: Real>(x: f64, y: f64, z: f64) -> Vector3<T> {
    Vector3::new(na::convert(x), na::convert(y), na::convert(z))
}

pub fn rest_tet<T: Real>() -> [Vector3<T>; 4] {
    [
        vec3(0.0, 0.0, 0.0),
        vec3(1.0, 0.0, 0.0),
        vec3(0.0, 1.0, 0.0),
        vec3(0.0, 0.0, 1.0),
    ]
}

pub fn rest_triangle<T: Real>() -> [Vector3<T>; 3] {
    [vec3(0.0, 0.0, 0.0), vec3(1.0, 0.1, 0.0), vec3(0.2, 0.8, 0.3)]
}

pub fn rest_hinge<T: Real>() -> [Vector3<T>; 4] {
    [
        vec3(0.0, 0.0, 0.0),
        vec3(1.0, 0.0, 0.0),
        vec3(0.4, 1.0, 0.1),
        vec3(0.5, -0.9, 0.4),
    ]
}

pub fn material() -> ElasticityParameters {
    ElasticityParameters::from_young_poisson(10.0, 0.3)
}

/// Seeded perturbations of `x`.
pub fn perturbations<T: Real, const N: usize>(
    x: &SVector<T, N>,
    range: f64,
    n: usize,
) -> Vec<SVector<T, N>> {
    (0..n as u64).map(|seed| utils::jitter(x, range, seed)).collect()
}
