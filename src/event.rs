//! This module defines collision events and the sources they are read from

use crate::{
    numeric::Float,
    photon::{PhotonCandidate, Subsystem},
    selection::EventGate,
    Result,
};
use eyre::ensure;
use std::collections::{HashMap, HashSet};

/// Identifier of a collision event
pub type EventId = u64;

/// Reduced collision event
///
/// Candidate counts are the ones recorded by the event reduction, which may
/// disagree with the candidates that a `PhotonSource` hands out for it.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Event identifier
    pub id: EventId,

    /// Primary vertex z position (cm)
    pub pos_z: Float,

    /// Number of tracks contributing to the primary vertex
    pub num_contrib: u16,

    /// Global event selection flag
    pub sel8: bool,

    /// Multiplicity estimator used for event mixing
    pub multiplicity: u32,

    /// Number of photon candidates of each subsystem
    pub counts: [u32; Subsystem::COUNT],

    /// Whether PHOS and CPV were read out
    pub phos_readout: bool,

    /// Whether EMCal was read out
    pub emc_readout: bool,
}
//
impl Event {
    /// Number of photon candidates recorded for a subsystem
    pub fn count(&self, subsystem: Subsystem) -> u32 {
        self.counts[subsystem.index()]
    }

    /// Truth that a subsystem was read out in this event
    pub fn has_readout(&self, subsystem: Subsystem) -> bool {
        match subsystem {
            Subsystem::Pcm => true,
            Subsystem::Phos => self.phos_readout,
            Subsystem::Emc => self.emc_readout,
        }
    }
}

/// Source of collision events, in ingestion order
pub trait EventSource {
    /// Every event
    fn events(&self) -> &[Event];

    /// Events eligible for event mixing
    ///
    /// These pass every quality gate and have enough candidates for at least
    /// one pair type.
    ///
    fn mixing_events(&self, gate: &EventGate) -> Vec<&Event> {
        self.events()
            .iter()
            .filter(|event| gate.accepts_for_mixing(event))
            .collect()
    }
}

/// Source of photon candidates, sliced by event
pub trait PhotonSource {
    /// Candidates of one subsystem in one event (empty if there are none)
    fn photons(&self, subsystem: Subsystem, event: EventId) -> &[PhotonCandidate];
}

/// In-memory storage of events and their photon candidates
#[derive(Clone, Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
    ids: HashSet<EventId>,
    photons: [HashMap<EventId, Vec<PhotonCandidate>>; Subsystem::COUNT],
}
//
impl EventStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event and its candidates
    ///
    /// Candidates are sorted by subsystem, keeping their relative order.
    /// Event identifiers must be unique, otherwise two events would share
    /// their candidate slices.
    ///
    pub fn push(
        &mut self,
        event: Event,
        photons: impl IntoIterator<Item = PhotonCandidate>,
    ) -> Result<()> {
        ensure!(
            self.ids.insert(event.id),
            "Event {} was already recorded",
            event.id
        );
        for photon in photons {
            self.photons[photon.subsystem().index()]
                .entry(event.id)
                .or_default()
                .push(photon);
        }
        self.events.push(event);
        Ok(())
    }

    /// Number of stored events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Truth that no event was stored
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total number of stored candidates of a subsystem
    pub fn num_photons(&self, subsystem: Subsystem) -> usize {
        self.photons[subsystem.index()].values().map(Vec::len).sum()
    }
}

impl EventSource for EventStore {
    fn events(&self) -> &[Event] {
        &self.events
    }
}

impl PhotonSource for EventStore {
    fn photons(&self, subsystem: Subsystem, event: EventId) -> &[PhotonCandidate] {
        self.photons[subsystem.index()]
            .get(&event)
            .map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn photons_are_sliced_by_event_and_subsystem() {
        let mut store = EventStore::new();
        store.push(
            testing::event(1, 0.),
            [
                testing::pcm(1., 0., 0.),
                testing::phos(2., 0., 0.),
                testing::pcm(3., 0., 0.),
            ],
        )
        .unwrap();
        store
            .push(testing::event(2, 0.), [testing::phos(4., 0., 0.)])
            .unwrap();

        let pcm_1 = store.photons(Subsystem::Pcm, 1);
        assert_eq!(pcm_1.len(), 2);
        assert_eq!(pcm_1[0].pt, 1.);
        assert_eq!(pcm_1[1].pt, 3.);
        assert_eq!(store.photons(Subsystem::Phos, 2)[0].pt, 4.);
        assert!(store.photons(Subsystem::Pcm, 2).is_empty());
        assert!(store.photons(Subsystem::Emc, 42).is_empty());
        assert_eq!(store.len(), 2);
        assert_eq!(store.num_photons(Subsystem::Phos), 2);
    }

    #[test]
    fn duplicate_event_ids_are_rejected() {
        let mut store = EventStore::new();
        store
            .push(testing::event(7, 0.), [testing::pcm(1., 0., 0.)])
            .unwrap();
        let err = store
            .push(testing::event(7, 1.), [testing::pcm(2., 0., 1.)])
            .unwrap_err();
        assert_eq!(err.to_string(), "Event 7 was already recorded");
        assert_eq!(store.len(), 1);
        assert_eq!(store.photons(Subsystem::Pcm, 7).len(), 1);
    }

    #[test]
    fn readout_flags() {
        let mut event = testing::event(1, 0.);
        event.phos_readout = false;
        assert!(event.has_readout(Subsystem::Pcm));
        assert!(!event.has_readout(Subsystem::Phos));
        assert!(event.has_readout(Subsystem::Emc));
    }
}
