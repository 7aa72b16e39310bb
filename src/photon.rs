//! Reconstructed photon candidates and the detector subsystems they come from

use crate::{
    momentum::{self, Momentum},
    numeric::Float,
};
use std::fmt::{self, Display};

/// Detector subsystem which reconstructed a photon candidate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subsystem {
    /// Photon conversion method (V0 made of an e⁺e⁻ track pair)
    Pcm,

    /// PHOS calorimeter
    Phos,

    /// EMCal calorimeter
    Emc,
}
//
impl Subsystem {
    /// Number of known subsystems
    pub const COUNT: usize = 3;

    /// All subsystems, in a fixed order
    pub const ALL: [Subsystem; Self::COUNT] = [Subsystem::Pcm, Subsystem::Phos, Subsystem::Emc];

    /// Position of this subsystem in per-subsystem arrays
    pub fn index(self) -> usize {
        match self {
            Subsystem::Pcm => 0,
            Subsystem::Phos => 1,
            Subsystem::Emc => 2,
        }
    }

    /// Short upper-case name, as used in pair type and output names
    pub fn name(self) -> &'static str {
        match self {
            Subsystem::Pcm => "PCM",
            Subsystem::Phos => "PHOS",
            Subsystem::Emc => "EMC",
        }
    }
}

impl Display for Subsystem {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.name())
    }
}

/// One of the two tracks of a conversion photon
#[derive(Clone, Debug, PartialEq)]
pub struct V0Leg {
    /// Transverse momentum (GeV/c)
    pub pt: Float,

    /// Pseudorapidity
    pub eta: Float,

    /// Number of crossed TPC pad rows
    pub tpc_crossed_rows: u16,

    /// TPC fit quality
    pub tpc_chi2_per_cluster: Float,

    /// TPC dE/dx deviation from the electron hypothesis, in sigmas
    pub tpc_nsigma_el: Float,
}

/// Calorimeter cluster
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    /// Deposited energy (GeV)
    pub energy: Float,

    /// Number of cells in the cluster
    pub num_cells: u16,

    /// Long axis of the shower ellipse
    pub m02: Float,

    /// Cluster time (ns)
    pub time: Float,
}

/// Subsystem-specific data used to validate a candidate
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// Conversion photon, validated through its legs
    Pcm([V0Leg; 2]),

    /// PHOS photon, validated through its cluster
    Phos(Cluster),

    /// EMCal photon, validated through its cluster
    Emc(Cluster),
}

/// Reconstructed photon candidate (mass is always zero)
#[derive(Clone, Debug, PartialEq)]
pub struct PhotonCandidate {
    /// Transverse momentum (GeV/c)
    pub pt: Float,

    /// Pseudorapidity
    pub eta: Float,

    /// Azimuthal angle
    pub phi: Float,

    /// Validation data
    pub payload: Payload,
}
//
impl PhotonCandidate {
    /// Subsystem which reconstructed this candidate
    pub fn subsystem(&self) -> Subsystem {
        match self.payload {
            Payload::Pcm(_) => Subsystem::Pcm,
            Payload::Phos(_) => Subsystem::Phos,
            Payload::Emc(_) => Subsystem::Emc,
        }
    }

    /// Massless 4-momentum of this candidate
    pub fn momentum(&self) -> Momentum {
        momentum::massless_from_pt_eta_phi(self.pt, self.eta, self.phi)
    }
}
