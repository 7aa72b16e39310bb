//! This module implements some domain-specific 4-momentum handling logic.

use crate::numeric::Float;
use nalgebra::{SVector, Vector3};
use prefix_num_ops::real::*;

/// 4-momentum dimension
pub const MOMENTUM_DIM: usize = 4;

/// Relativistic 4-momentum
pub type Momentum = SVector<Float, MOMENTUM_DIM>;

/// Spatial part of a 4-momentum
pub type Momentum3 = Vector3<Float>;

/// Convenience const for accessing the X coordinate of a 4-vector
pub const X: usize = 0;

/// Convenience const for accessing the Y coordinate of a 4-vector
pub const Y: usize = 1;

/// Convenience const for accessing the Z coordinate of a 4-vector
pub const Z: usize = 2;

/// Convenience const for accessing the E coordinate of a 4-vector
pub const E: usize = 3;

/// Build the 4-momentum of a massless particle from collider coordinates
pub fn massless_from_pt_eta_phi(pt: Float, eta: Float, phi: Float) -> Momentum {
    let px = pt * phi.cos();
    let py = pt * phi.sin();
    let pz = pt * eta.sinh();
    let e = sqrt(px * px + py * py + pz * pz);
    Momentum::new(px, py, pz, e)
}

/// Get the spatial part of a 4-momentum
pub fn xyz(p: &Momentum) -> Momentum3 {
    p.xyz()
}

/// Transverse momentum
pub fn pt(p: &Momentum) -> Float {
    sqrt(p[X] * p[X] + p[Y] * p[Y])
}

/// Minkowski square E² - |p|²
pub fn mass2(p: &Momentum) -> Float {
    p[E] * p[E] - xyz(p).norm_squared()
}

/// Invariant mass, signed so that spacelike vectors get a negative mass
///
/// For m² < 0 this returns -√(-m²) instead of failing, which is what makes
/// the invariant mass of a photon pair's momentum difference usable.
///
pub fn invariant_mass(p: &Momentum) -> Float {
    let m2 = mass2(p);
    if m2 >= 0. {
        sqrt(m2)
    } else {
        -sqrt(abs(m2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::reals::consts::SQRT_2;
    use approx::assert_abs_diff_eq;

    #[test]
    fn massless_momentum_is_lightlike() {
        let p = massless_from_pt_eta_phi(1.3, 0.4, 2.1);
        assert_abs_diff_eq!(mass2(&p), 0., epsilon = 1e-5);
        assert_abs_diff_eq!(pt(&p), 1.3, epsilon = 1e-5);
    }

    #[test]
    fn spacelike_mass_is_negative() {
        let p = Momentum::new(1., -1., 0., 0.);
        assert_abs_diff_eq!(invariant_mass(&p), -SQRT_2, epsilon = 1e-6);
        let p = Momentum::new(0., 0., 3., 5.);
        assert_abs_diff_eq!(invariant_mass(&p), 4., epsilon = 1e-6);
    }
}
