//! Event-level quality gates and pair-level candidate selection

use crate::{
    event::Event,
    numeric::Float,
    pairtype::PairType,
    photon::PhotonCandidate,
    photoncut::PhotonCut,
};
use prefix_num_ops::real::*;

/// Event selection stages, in the order in which they are applied
///
/// Each stage is only reached by events which passed all previous stages.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventStage {
    /// Every event considered for pairing
    Seen,

    /// Global event selection flag is set
    Selected,

    /// Primary vertex has contributors
    HasContributors,

    /// Primary vertex is close enough to the nominal interaction point
    VertexAccepted,
}
//
impl EventStage {
    /// Number of stages
    pub const COUNT: usize = 4;

    /// All stages, in application order
    pub const ALL: [EventStage; Self::COUNT] = [
        EventStage::Seen,
        EventStage::Selected,
        EventStage::HasContributors,
        EventStage::VertexAccepted,
    ];

    /// Position of this stage in stage counters
    pub fn index(self) -> usize {
        self as usize
    }

    /// Label used in output files
    pub fn label(self) -> &'static str {
        match self {
            EventStage::Seen => "all",
            EventStage::Selected => "sel8",
            EventStage::HasContributors => "Ncontrib > 0",
            EventStage::VertexAccepted => "|Zvtx| < cut",
        }
    }
}

/// Event quality requirements shared by same-event pairing and mixing
#[derive(Clone, Debug, PartialEq)]
pub struct EventGate {
    max_abs_vertex_z: Float,
}
//
impl EventGate {
    /// Set up the gate with the maximal accepted |vertex z|
    pub fn new(max_abs_vertex_z: Float) -> Self {
        Self { max_abs_vertex_z }
    }

    /// Last stage that an event passes
    pub fn last_passed_stage(&self, event: &Event) -> EventStage {
        if !event.sel8 {
            EventStage::Seen
        } else if event.num_contrib == 0 {
            EventStage::Selected
        } else if !(abs(event.pos_z) < self.max_abs_vertex_z) {
            EventStage::HasContributors
        } else {
            EventStage::VertexAccepted
        }
    }

    /// Truth that an event passes every stage
    pub fn accepts(&self, event: &Event) -> bool {
        self.last_passed_stage(event) == EventStage::VertexAccepted
    }

    /// Truth that an event belongs in the event mixing pool
    ///
    /// On top of the quality stages, the event must have enough candidates
    /// to contribute to at least one pair type.
    ///
    pub fn accepts_for_mixing(&self, event: &Event) -> bool {
        self.accepts(event)
            && PairType::ALL
                .iter()
                .any(|pair_type| pair_type.has_min_candidates(event))
    }
}

/// Decide whether both photons of a pair pass their side's cut
///
/// The first photon must come from the first subsystem of the pair type and
/// pass `cut1`, the second photon from the second subsystem and pass `cut2`.
/// Conversion photons are validated through their legs, calorimeter photons
/// through their cluster.
///
pub fn is_selected_pair(
    pair_type: PairType,
    g1: &PhotonCandidate,
    g2: &PhotonCandidate,
    cut1: &PhotonCut,
    cut2: &PhotonCut,
) -> bool {
    let (first, second) = pair_type.subsystems();
    debug_assert_eq!(cut1.subsystem(), first);
    debug_assert_eq!(cut2.subsystem(), second);
    g1.subsystem() == first
        && g2.subsystem() == second
        && cut1.is_selected(g1)
        && cut2.is_selected(g2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        photon::Subsystem,
        photoncut::{BuiltinCatalog, CutCatalog},
        testing,
    };

    #[test]
    fn stages_are_applied_in_order() {
        let gate = EventGate::new(10.);
        let mut event = testing::event(1, 3.);
        assert_eq!(gate.last_passed_stage(&event), EventStage::VertexAccepted);
        event.pos_z = 10.5;
        assert_eq!(gate.last_passed_stage(&event), EventStage::HasContributors);
        event.num_contrib = 0;
        assert_eq!(gate.last_passed_stage(&event), EventStage::Selected);
        event.sel8 = false;
        assert_eq!(gate.last_passed_stage(&event), EventStage::Seen);
    }

    #[test]
    fn vertex_cut_is_strict() {
        let gate = EventGate::new(10.);
        assert!(gate.accepts(&testing::event(1, -9.9)));
        assert!(!gate.accepts(&testing::event(1, 10.)));
        assert!(!gate.accepts(&testing::event(1, -10.5)));
        assert!(!gate.accepts(&testing::event(1, Float::NAN)));
    }

    #[test]
    fn mixing_pool_needs_candidates() {
        let gate = EventGate::new(10.);
        let mut event = testing::event(1, 9.9);
        assert!(!gate.accepts_for_mixing(&event));
        event.counts = [1, 0, 1];
        assert!(gate.accepts_for_mixing(&event));
        event.num_contrib = 0;
        assert!(!gate.accepts_for_mixing(&event));
    }

    #[test]
    fn cross_subsystem_pairs_use_their_own_cuts() {
        let pcm_cut = BuiltinCatalog.resolve(Subsystem::Pcm, "analysis").unwrap();
        let phos_cut = BuiltinCatalog.resolve(Subsystem::Phos, "test03").unwrap();
        let g1 = testing::pcm(0.5, 0.1, 0.);
        let mut g2 = testing::phos(0.5, 0.05, 1.);
        assert!(is_selected_pair(PairType::PcmPhos, &g1, &g2, &pcm_cut, &phos_cut));

        g2.pt = 0.01;
        if let crate::photon::Payload::Phos(cluster) = &mut g2.payload {
            cluster.energy = 0.01;
        }
        assert!(!is_selected_pair(PairType::PcmPhos, &g1, &g2, &pcm_cut, &phos_cut));
    }

    #[test]
    fn photons_must_sit_on_their_side() {
        let cut = BuiltinCatalog.resolve(Subsystem::Pcm, "nocut").unwrap();
        let g1 = testing::pcm(0.5, 0.1, 0.);
        let g2 = testing::phos(0.5, 0.05, 1.);
        assert!(is_selected_pair(PairType::PcmPcm, &g1, &g1, &cut, &cut));
        assert!(!is_selected_pair(PairType::PcmPcm, &g1, &g2, &cut, &cut));
    }
}
