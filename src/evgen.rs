//! This module provides synthetic collision event generation facilities

use crate::{
    event::{Event, EventId, EventStore},
    numeric::{reals::consts::PI, Float},
    photon::{Cluster, Payload, PhotonCandidate, Subsystem, V0Leg},
    random::RandomGenerator,
    Result,
};

use prefix_num_ops::real::*;

/// Generated vertex z positions are spread uniformly over ±this (cm)
const VERTEX_Z_SPREAD: Float = 12.;

/// Probability that the global event selection flag is set
const SEL8_PROBABILITY: Float = 0.95;

/// Probability that the primary vertex has no contributor
const NO_CONTRIB_PROBABILITY: Float = 0.03;

/// Multiplicities are drawn in [0, this)
const MAX_MULTIPLICITY: u32 = 250;

/// Inverse slope of the photon pT spectrum (GeV/c)
const PT_SLOPE: Float = 0.4;

/// Smallest generated photon pT (GeV/c)
const MIN_PT: Float = 0.02;

/// Per-subsystem generation parameters
struct SubsystemModel {
    /// Candidates per event are drawn in [0, this)
    max_candidates: u32,

    /// Pseudorapidity acceptance
    max_abs_eta: Float,

    /// Probability that the subsystem was read out
    readout_probability: Float,
}

/// Generation parameters, indexed by subsystem
const MODELS: [SubsystemModel; Subsystem::COUNT] = [
    SubsystemModel {
        max_candidates: 6,
        max_abs_eta: 1.0,
        readout_probability: 1.,
    },
    SubsystemModel {
        max_candidates: 4,
        max_abs_eta: 0.13,
        readout_probability: 0.8,
    },
    SubsystemModel {
        max_candidates: 5,
        max_abs_eta: 0.75,
        readout_probability: 0.9,
    },
];

/// Generator of reduced collision events with photon candidates
///
/// Events are fully determined by the state of the random number generator,
/// so a given seed always produces the same event store.
///
pub struct EventGenerator {
    num_events: usize,
}
//
impl EventGenerator {
    /// Prepare the generation of a number of events
    pub fn new(num_events: usize) -> Self {
        Self { num_events }
    }

    /// Generate every event, with consecutive identifiers starting at 0
    pub fn generate(&self, rng: &mut RandomGenerator) -> Result<EventStore> {
        let mut store = EventStore::new();
        for id in 0..self.num_events as EventId {
            let (event, photons) = Self::generate_event(id, rng);
            store.push(event, photons)?;
        }
        log::info!(
            "Generated {} events with {} PCM, {} PHOS, {} EMC candidates",
            store.len(),
            store.num_photons(Subsystem::Pcm),
            store.num_photons(Subsystem::Phos),
            store.num_photons(Subsystem::Emc),
        );
        Ok(store)
    }

    /// Generate one event and its photon candidates
    fn generate_event(id: EventId, rng: &mut RandomGenerator) -> (Event, Vec<PhotonCandidate>) {
        let pos_z = rng.uniform(-VERTEX_Z_SPREAD, VERTEX_Z_SPREAD);
        let sel8 = rng.chance(SEL8_PROBABILITY);
        let num_contrib = if rng.chance(NO_CONTRIB_PROBABILITY) {
            0
        } else {
            1 + rng.below(60) as u16
        };
        let multiplicity = rng.below(MAX_MULTIPLICITY);

        let mut event = Event {
            id,
            pos_z,
            num_contrib,
            sel8,
            multiplicity,
            counts: [0; Subsystem::COUNT],
            phos_readout: rng.chance(MODELS[Subsystem::Phos.index()].readout_probability),
            emc_readout: rng.chance(MODELS[Subsystem::Emc.index()].readout_probability),
        };

        let mut photons = Vec::new();
        for subsystem in Subsystem::ALL {
            if !event.has_readout(subsystem) {
                continue;
            }
            let model = &MODELS[subsystem.index()];
            let count = rng.below(model.max_candidates);
            for _ in 0..count {
                photons.push(Self::generate_photon(subsystem, model, rng));
            }
            event.counts[subsystem.index()] = count;
        }
        (event, photons)
    }

    /// Generate one photon candidate with plausible validation data
    fn generate_photon(
        subsystem: Subsystem,
        model: &SubsystemModel,
        rng: &mut RandomGenerator,
    ) -> PhotonCandidate {
        // Exponential pT spectrum, sampled by inversion
        let pt = MIN_PT - PT_SLOPE * ln(1. - rng.random());
        let eta = rng.uniform(-model.max_abs_eta, model.max_abs_eta);
        let phi = rng.uniform(0., 2. * PI);
        let payload = match subsystem {
            Subsystem::Pcm => {
                let fraction = rng.uniform(0.2, 0.8);
                let mut leg = |leg_pt: Float| V0Leg {
                    pt: leg_pt,
                    eta: eta + rng.uniform(-0.05, 0.05),
                    tpc_crossed_rows: 30 + rng.below(130) as u16,
                    tpc_chi2_per_cluster: rng.uniform(0., 5.),
                    tpc_nsigma_el: rng.uniform(-4., 4.),
                };
                Payload::Pcm([leg(fraction * pt), leg((1. - fraction) * pt)])
            }
            Subsystem::Phos => Payload::Phos(Self::generate_cluster(pt, eta, rng)),
            Subsystem::Emc => Payload::Emc(Self::generate_cluster(pt, eta, rng)),
        };
        PhotonCandidate {
            pt,
            eta,
            phi,
            payload,
        }
    }

    /// Generate a calorimeter cluster for a photon
    fn generate_cluster(pt: Float, eta: Float, rng: &mut RandomGenerator) -> Cluster {
        Cluster {
            energy: pt * eta.cosh(),
            num_cells: 1 + rng.below(10) as u16,
            m02: rng.uniform(0.05, 1.),
            time: rng.uniform(-30., 30.),
        }
    }
}
