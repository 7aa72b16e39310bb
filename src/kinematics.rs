//! Relative momentum decomposition of photon pairs
//!
//! For two massless photons with 4-momenta v1 and v2, we use the momentum
//! difference q = v1 - v2 and the average pair momentum k = (v1 + v2) / 2.
//! The spatial part of q is projected on the usual Bertsch-Pratt axes:
//!
//! * "out" is along the spatial part of k,
//! * "long" is the beam axis,
//! * "side" is out × long.
//!
//! NOTE: These axes are computed in the laboratory frame. No boost to the
//!       longitudinally co-moving system is applied, so qout and qlong still
//!       carry the longitudinal motion of the pair.

use crate::{
    momentum::{self, Momentum3, E, Z},
    numeric::Float,
    photon::PhotonCandidate,
};
use nalgebra::SVector;

/// Number of pair observables
pub const NUM_OBSERVABLES: usize = 5;

/// Pair observables in histogram axis order (qinv, qlong, qout, qside, kt)
pub type ObservableVector = SVector<Float, NUM_OBSERVABLES>;

/// Observables of one photon pair
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObservableRecord {
    /// Invariant relative momentum
    pub qinv: Float,

    /// Relative momentum along the beam
    pub qlong: Float,

    /// Relative momentum along the pair momentum
    pub qout: Float,

    /// Relative momentum perpendicular to out and long
    pub qside: Float,

    /// Transverse momentum of the average pair momentum
    pub kt: Float,
}
//
impl ObservableRecord {
    /// Compute the observables of a photon pair
    ///
    /// Returns None when the average pair momentum vanishes, as the "out"
    /// direction is then undefined.
    ///
    pub fn new(g1: &PhotonCandidate, g2: &PhotonCandidate) -> Option<Self> {
        let v1 = g1.momentum();
        let v2 = g2.momentum();
        let q = v1 - v2;
        let k = 0.5 * (v1 + v2);

        // Back-to-back photons of equal momentum leave k with rounding noise
        // as its only spatial component
        let k_xyz = momentum::xyz(&k);
        let k_norm = k_xyz.norm();
        if !(k_norm > Float::EPSILON * k[E] && k_norm.is_finite()) {
            return None;
        }

        let q_xyz = momentum::xyz(&q);
        let uv_out = k_xyz / k_norm;
        let uv_long = Momentum3::ith(Z, 1.);
        let uv_side = uv_out.cross(&uv_long);

        Some(Self {
            qinv: -momentum::invariant_mass(&q),
            qlong: q_xyz.dot(&uv_long),
            qout: q_xyz.dot(&uv_out),
            qside: q_xyz.dot(&uv_side),
            kt: momentum::pt(&k),
        })
    }

    /// Observables as a vector, in histogram axis order
    pub fn values(&self) -> ObservableVector {
        ObservableVector::new(self.qinv, self.qlong, self.qout, self.qside, self.kt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        numeric::reals::consts::{FRAC_PI_2, PI, SQRT_2},
        testing,
    };
    use approx::assert_abs_diff_eq;

    #[test]
    fn identical_photons() {
        let g = testing::pcm(1.7, 0.3, 0.8);
        let obs = ObservableRecord::new(&g, &g).unwrap();
        assert_abs_diff_eq!(obs.qinv, 0., epsilon = 1e-6);
        assert_abs_diff_eq!(obs.qlong, 0., epsilon = 1e-6);
        assert_abs_diff_eq!(obs.qout, 0., epsilon = 1e-6);
        assert_abs_diff_eq!(obs.qside, 0., epsilon = 1e-6);
        assert_abs_diff_eq!(obs.kt, 1.7, epsilon = 1e-5);
    }

    #[test]
    fn transverse_photons_at_right_angle() {
        let g1 = testing::pcm(1., 0., 0.);
        let g2 = testing::phos(1., 0., FRAC_PI_2);
        let obs = ObservableRecord::new(&g1, &g2).unwrap();
        assert_abs_diff_eq!(obs.qinv, SQRT_2, epsilon = 1e-5);
        assert_abs_diff_eq!(obs.qlong, 0., epsilon = 1e-6);
        assert_abs_diff_eq!(obs.qout, 0., epsilon = 1e-6);
        assert_abs_diff_eq!(obs.qside, SQRT_2, epsilon = 1e-5);
        assert_abs_diff_eq!(obs.kt, 0.5 * SQRT_2, epsilon = 1e-5);
    }

    // Pins the laboratory-frame "out" axis: in the longitudinally co-moving
    // frame, this pair would have qout = 0.
    #[test]
    fn out_axis_follows_lab_pair_momentum() {
        let g1 = testing::pcm(1., 0., 0.);
        let g2 = testing::pcm(1., (1. as Float).asinh(), 0.);
        let obs = ObservableRecord::new(&g1, &g2).unwrap();
        assert_abs_diff_eq!(obs.qlong, -1., epsilon = 1e-5);
        assert_abs_diff_eq!(obs.qout, -1. / (5. as Float).sqrt(), epsilon = 1e-5);
        assert_abs_diff_eq!(obs.qside, 0., epsilon = 1e-6);
        assert_abs_diff_eq!(obs.qinv, (2. * SQRT_2 - 2.).sqrt(), epsilon = 1e-5);
        assert_abs_diff_eq!(obs.kt, 1., epsilon = 1e-5);
    }

    // Swapping the photons flips q but not k: qinv and kt are unchanged, the
    // three projections change sign.
    #[test]
    fn swap_convention() {
        let g1 = testing::pcm(0.8, 0.2, 0.4);
        let g2 = testing::pcm(1.3, -0.4, 1.1);
        let a = ObservableRecord::new(&g1, &g2).unwrap();
        let b = ObservableRecord::new(&g2, &g1).unwrap();
        assert_abs_diff_eq!(a.qinv, b.qinv, epsilon = 1e-6);
        assert_abs_diff_eq!(a.kt, b.kt, epsilon = 1e-6);
        assert_abs_diff_eq!(a.qlong, -b.qlong, epsilon = 1e-6);
        assert_abs_diff_eq!(a.qout, -b.qout, epsilon = 1e-6);
        assert_abs_diff_eq!(a.qside, -b.qside, epsilon = 1e-6);
        assert!(a.qinv > 0.);
    }

    #[test]
    fn back_to_back_pair_is_degenerate() {
        let g1 = testing::emc(2., 0., 0.);
        let g2 = testing::emc(2., 0., PI);
        assert_eq!(ObservableRecord::new(&g1, &g2), None);
    }

    #[test]
    fn values_follow_axis_order() {
        let obs = ObservableRecord {
            qinv: 1.,
            qlong: 2.,
            qout: 3.,
            qside: 4.,
            kt: 5.,
        };
        assert_eq!(obs.values(), ObservableVector::new(1., 2., 3., 4., 5.));
    }
}
