//! Builders shared by the unit tests

use crate::{
    event::{Event, EventId, EventStore},
    numeric::Float,
    photon::{Cluster, Payload, PhotonCandidate, Subsystem, V0Leg},
};

/// Well-reconstructed conversion photon
pub fn pcm(pt: Float, eta: Float, phi: Float) -> PhotonCandidate {
    let leg = V0Leg {
        pt: pt / 2.,
        eta,
        tpc_crossed_rows: 100,
        tpc_chi2_per_cluster: 1.,
        tpc_nsigma_el: 0.,
    };
    PhotonCandidate {
        pt,
        eta,
        phi,
        payload: Payload::Pcm([leg.clone(), leg]),
    }
}

fn cluster(pt: Float) -> Cluster {
    Cluster {
        energy: pt,
        num_cells: 4,
        m02: 0.3,
        time: 0.,
    }
}

/// Well-reconstructed PHOS photon
pub fn phos(pt: Float, eta: Float, phi: Float) -> PhotonCandidate {
    PhotonCandidate {
        pt,
        eta,
        phi,
        payload: Payload::Phos(cluster(pt)),
    }
}

/// Well-reconstructed EMCal photon
pub fn emc(pt: Float, eta: Float, phi: Float) -> PhotonCandidate {
    PhotonCandidate {
        pt,
        eta,
        phi,
        payload: Payload::Emc(cluster(pt)),
    }
}

/// Event which passes every quality gate, with empty candidate counts
pub fn event(id: EventId, pos_z: Float) -> Event {
    Event {
        id,
        pos_z,
        num_contrib: 20,
        sel8: true,
        multiplicity: 15,
        counts: [0; Subsystem::COUNT],
        phos_readout: true,
        emc_readout: true,
    }
}

/// Owned cut name list
pub fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|&name| name.to_owned()).collect()
}

/// Add an event with distinct photons of the given subsystems to a store
///
/// The event's candidate counts are set to match.
///
pub fn push_event(
    store: &mut EventStore,
    mut event: Event,
    multiplicities: &[(Subsystem, usize)],
) -> EventId {
    let id = event.id;
    let mut photons = Vec::new();
    for &(subsystem, n) in multiplicities {
        photons.extend((0..n).map(|i| {
            let pt = 0.5 + 0.1 * i as Float;
            let phi = 0.3 * i as Float;
            match subsystem {
                Subsystem::Pcm => pcm(pt, 0.1, phi),
                Subsystem::Phos => phos(pt, 0.05, phi),
                Subsystem::Emc => emc(pt, 0.2, phi),
            }
        }));
        event.counts[subsystem.index()] = n as u32;
    }
    store.push(event, photons).unwrap();
    id
}
