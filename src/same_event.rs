//! Pairing of photon candidates from the same collision event

use crate::{
    event::{Event, EventSource, PhotonSource},
    histograms::{BucketLayout, BucketStorage, PairKind, VertexFill},
    kinematics::ObservableRecord,
    photon::PhotonCandidate,
    photoncut::CutSets,
    selection::{self, EventGate, EventStage},
};

/// Pair photons within each event of a source
///
/// Events are processed in ingestion order. Each one goes through the event
/// gate, with every reached stage recorded in the pair type's event
/// accounting, and events which pass it contribute all their accepted photon
/// pairs to the "same event" buckets.
///
pub fn pair_events(
    source: &(impl EventSource + PhotonSource),
    gate: &EventGate,
    cuts: &CutSets,
    layout: &BucketLayout,
    storage: &mut BucketStorage,
) {
    let pair_type = layout.pair_type();
    let mut num_accepted = 0;
    for event in source.events() {
        if !pair_type.has_readout(event) {
            continue;
        }
        if !record_event(gate, event, storage) {
            continue;
        }
        num_accepted += 1;
        pair_event(source, event, cuts, layout, storage);
    }
    log::debug!(
        "{}: {} events accepted for same-event pairing",
        pair_type,
        num_accepted
    );
}

/// Run an event through the gate, recording its progress
///
/// Returns the truth that the event passed every stage.
///
fn record_event(gate: &EventGate, event: &Event, storage: &mut BucketStorage) -> bool {
    let accounting = storage.events_mut();
    accounting.fill_vertex(VertexFill::Before, event.pos_z);
    let last_stage = gate.last_passed_stage(event);
    for stage in EventStage::ALL.into_iter().take_while(|&stage| stage <= last_stage) {
        accounting.count_stage(stage);
    }
    let accepted = last_stage == EventStage::VertexAccepted;
    if accepted {
        accounting.fill_vertex(VertexFill::After, event.pos_z);
    }
    accepted
}

/// Pair the photons of one accepted event
fn pair_event(
    source: &impl PhotonSource,
    event: &Event,
    cuts: &CutSets,
    layout: &BucketLayout,
    storage: &mut BucketStorage,
) {
    let pair_type = layout.pair_type();
    let (first, second) = pair_type.subsystems();
    let photons1 = source.photons(first, event.id);
    let photons2 = source.photons(second, event.id);
    let (cuts1, cuts2) = (cuts.get(first), cuts.get(second));

    for comb in layout.combinations() {
        let (cut1, cut2) = (&cuts1[comb.cut1], &cuts2[comb.cut2]);
        let mut fill = |g1: &PhotonCandidate, g2: &PhotonCandidate| {
            if !selection::is_selected_pair(pair_type, g1, g2, cut1, cut2) {
                return;
            }
            match ObservableRecord::new(g1, g2) {
                Some(record) => storage.fill(comb.slot, PairKind::Same, &record),
                None => storage.count_degenerate(PairKind::Same),
            }
        };

        if pair_type.is_symmetric() {
            // Strictly upper triangular: no self-pairs, no double counting
            for (i, g1) in photons1.iter().enumerate() {
                for g2 in &photons1[i + 1..] {
                    fill(g1, g2);
                }
            }
        } else {
            for g1 in photons1 {
                for g2 in photons2 {
                    fill(g1, g2);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::EventStore,
        histograms::PairTypeHistograms,
        numeric::reals::consts::PI,
        pairtype::PairType,
        photon::Subsystem,
        photoncut::BuiltinCatalog,
        testing,
    };

    fn cut_sets(pcm: &[&str], phos: &[&str]) -> CutSets {
        let pcm = testing::names(pcm);
        let phos = testing::names(phos);
        CutSets::resolve(&BuiltinCatalog, |subsystem| match subsystem {
            Subsystem::Pcm => &pcm[..],
            Subsystem::Phos => &phos[..],
            Subsystem::Emc => &[],
        })
        .unwrap()
    }

    fn run(store: &EventStore, pair_type: PairType, cuts: &CutSets) -> PairTypeHistograms {
        let mut hists = PairTypeHistograms::new(pair_type, cuts);
        let (layout, storage) = hists.split_mut();
        pair_events(store, &EventGate::new(10.), cuts, layout, storage);
        hists
    }

    fn same_entries(hists: &PairTypeHistograms) -> Vec<u64> {
        let layout = hists.layout();
        layout
            .combinations()
            .iter()
            .map(|comb| hists.storage().histogram(comb.slot, PairKind::Same).entries())
            .collect()
    }

    #[test]
    fn symmetric_pairs_are_upper_triangular() {
        let mut store = EventStore::new();
        testing::push_event(&mut store, testing::event(1, 0.), &[(Subsystem::Pcm, 5)]);
        testing::push_event(&mut store, testing::event(2, 0.), &[(Subsystem::Pcm, 1)]);
        let cuts = cut_sets(&["nocut", "analysis"], &[]);
        let hists = run(&store, PairType::PcmPcm, &cuts);
        assert_eq!(same_entries(&hists), [10, 10]);
        assert_eq!(hists.storage().degenerate(PairKind::Same), 0);
    }

    #[test]
    fn self_pairs_would_show_up_as_zero_qinv() {
        let mut store = EventStore::new();
        testing::push_event(&mut store, testing::event(1, 0.), &[(Subsystem::Pcm, 4)]);
        let cuts = cut_sets(&["nocut"], &[]);
        let hists = run(&store, PairType::PcmPcm, &cuts);
        let slot = hists.layout().find(0, 0).unwrap();
        let hist = hists.storage().histogram(slot, PairKind::Same);
        // Test photons are all distinct, so no pair lands in the first qinv bin
        assert!(hist.bins().all(|(index, _)| index[0] > 0));
        assert_eq!(hist.entries(), 6);
    }

    #[test]
    fn asymmetric_pairs_use_full_product() {
        let mut store = EventStore::new();
        testing::push_event(
            &mut store,
            testing::event(1, 0.),
            &[(Subsystem::Pcm, 3), (Subsystem::Phos, 2)],
        );
        let cuts = cut_sets(&["analysis"], &["test02", "test03"]);
        let hists = run(&store, PairType::PcmPhos, &cuts);
        assert_eq!(same_entries(&hists), [6, 6]);
    }

    #[test]
    fn cuts_filter_pairs() {
        let mut store = EventStore::new();
        let mut photons = vec![testing::pcm(0.5, 0.1, 0.), testing::pcm(0.6, 0.1, 1.)];
        photons.push(testing::pcm(0.05, 0.1, 2.));
        store.push(testing::event(1, 0.), photons).unwrap();
        let cuts = cut_sets(&["nocut", "analysis"], &[]);
        let hists = run(&store, PairType::PcmPcm, &cuts);
        assert_eq!(same_entries(&hists), [3, 1]);
    }

    #[test]
    fn gated_events_contribute_nothing() {
        let mut store = EventStore::new();
        testing::push_event(&mut store, testing::event(1, 10.5), &[(Subsystem::Pcm, 3)]);
        let mut no_contrib = testing::event(2, 9.9);
        no_contrib.num_contrib = 0;
        testing::push_event(&mut store, no_contrib, &[(Subsystem::Pcm, 3)]);
        let mut not_selected = testing::event(3, 0.);
        not_selected.sel8 = false;
        testing::push_event(&mut store, not_selected, &[(Subsystem::Pcm, 3)]);
        testing::push_event(&mut store, testing::event(4, -2.), &[(Subsystem::Pcm, 3)]);

        let cuts = cut_sets(&["nocut"], &[]);
        let hists = run(&store, PairType::PcmPcm, &cuts);
        assert_eq!(same_entries(&hists), [3]);

        let events = hists.storage().events();
        let counts = EventStage::ALL.map(|stage| events.stage_count(stage));
        assert_eq!(counts, [4, 3, 2, 1]);
        assert_eq!(events.z_before.entries(), 4);
        assert_eq!(events.z_after.entries(), 1);
    }

    #[test]
    fn readout_is_required_before_accounting() {
        let mut store = EventStore::new();
        let mut event = testing::event(1, 0.);
        event.phos_readout = false;
        testing::push_event(&mut store, event, &[(Subsystem::Phos, 3)]);
        testing::push_event(&mut store, testing::event(2, 0.), &[(Subsystem::Phos, 2)]);

        let cuts = cut_sets(&[], &["test02"]);
        let hists = run(&store, PairType::PhosPhos, &cuts);
        assert_eq!(same_entries(&hists), [1]);
        assert_eq!(hists.storage().events().stage_count(EventStage::Seen), 1);
    }

    #[test]
    fn missing_photons_yield_no_pairs() {
        let mut store = EventStore::new();
        store.push(testing::event(1, 0.), []).unwrap();
        let cuts = cut_sets(&["nocut"], &["nocut"]);
        let hists = run(&store, PairType::PcmPhos, &cuts);
        assert_eq!(same_entries(&hists), [0]);
        assert_eq!(
            hists.storage().events().stage_count(EventStage::VertexAccepted),
            1
        );
    }

    #[test]
    fn degenerate_pairs_are_counted() {
        let mut store = EventStore::new();
        store.push(
            testing::event(1, 0.),
            [testing::emc(2., 0., 0.), testing::emc(2., 0., PI)],
        )
        .unwrap();
        let emc = testing::names(&["nocut"]);
        let cuts = CutSets::resolve(&BuiltinCatalog, |subsystem| match subsystem {
            Subsystem::Emc => &emc[..],
            _ => &[],
        })
        .unwrap();
        let hists = run(&store, PairType::EmcEmc, &cuts);
        assert_eq!(same_entries(&hists), [0]);
        assert_eq!(hists.storage().degenerate(PairKind::Same), 1);
    }
}
