//! Combinations of subsystems that photon pairs are built from

use crate::{event::Event, photon::Subsystem};
use std::fmt::{self, Display};

/// Subsystems of the first and second photon of a pair
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum PairType {
    PcmPcm,
    PhosPhos,
    EmcEmc,
    PcmPhos,
    PcmEmc,
    PhosEmc,
}
//
impl PairType {
    /// Number of pair types
    pub const COUNT: usize = 6;

    /// All pair types, in canonical order
    pub const ALL: [PairType; Self::COUNT] = [
        PairType::PcmPcm,
        PairType::PhosPhos,
        PairType::EmcEmc,
        PairType::PcmPhos,
        PairType::PcmEmc,
        PairType::PhosEmc,
    ];

    /// Subsystem of the first and second photon
    pub fn subsystems(self) -> (Subsystem, Subsystem) {
        use Subsystem::*;
        match self {
            PairType::PcmPcm => (Pcm, Pcm),
            PairType::PhosPhos => (Phos, Phos),
            PairType::EmcEmc => (Emc, Emc),
            PairType::PcmPhos => (Pcm, Phos),
            PairType::PcmEmc => (Pcm, Emc),
            PairType::PhosEmc => (Phos, Emc),
        }
    }

    /// Truth that both photons come from the same subsystem
    ///
    /// Symmetric pairs are built from a single candidate list and only use
    /// identical cuts on both sides.
    ///
    pub fn is_symmetric(self) -> bool {
        let (first, second) = self.subsystems();
        first == second
    }

    /// Name used in logs and output files
    pub fn name(self) -> &'static str {
        match self {
            PairType::PcmPcm => "PCMPCM",
            PairType::PhosPhos => "PHOSPHOS",
            PairType::EmcEmc => "EMCEMC",
            PairType::PcmPhos => "PCMPHOS",
            PairType::PcmEmc => "PCMEMC",
            PairType::PhosEmc => "PHOSEMC",
        }
    }

    /// Truth that an event has enough candidates to contribute a pair
    ///
    /// Symmetric pairs need two candidates of the shared subsystem, other
    /// pairs need one candidate of each subsystem.
    ///
    pub fn has_min_candidates(self, event: &Event) -> bool {
        let (first, second) = self.subsystems();
        if self.is_symmetric() {
            event.count(first) >= 2
        } else {
            event.count(first) >= 1 && event.count(second) >= 1
        }
    }

    /// Truth that every subsystem of this pair type was read out
    pub fn has_readout(self, event: &Event) -> bool {
        let (first, second) = self.subsystems();
        event.has_readout(first) && event.has_readout(second)
    }
}

impl Display for PairType {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.name())
    }
}
