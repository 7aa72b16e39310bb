//! Event mixing: pairing photons from different, similar events
//!
//! Events of the mixing pool are sorted into bins of vertex z and
//! multiplicity. Within a bin, each event (the "anchor") is paired with the
//! events that follow it in ingestion order, up to a window size, and only
//! until a maximal number of partner events (the mixing depth) was used.

use crate::{
    event::{Event, EventId, EventSource, PhotonSource},
    histograms::{BucketLayout, BucketStorage, PairKind},
    kinematics::ObservableRecord,
    numeric::Float,
    pairtype::PairType,
    photoncut::CutSets,
    selection::{self, EventGate},
};
use eyre::ensure;
use std::collections::BTreeMap;

/// Variable-width bin edges with open-ended outer bins
///
/// N edges define N-1 bins. Values below the second edge go to the first
/// bin, values at or above the next-to-last edge go to the last bin.
///
#[derive(Clone, Debug, PartialEq)]
pub struct BinEdges(Vec<Float>);
//
impl BinEdges {
    /// Check and wrap a list of bin edges
    pub fn new(edges: Vec<Float>) -> crate::Result<Self> {
        ensure!(edges.len() >= 2, "At least two bin edges are needed");
        ensure!(
            edges.windows(2).all(|pair| pair[0] < pair[1]),
            "Bin edges must be strictly increasing"
        );
        Ok(Self(edges))
    }

    /// Number of bins
    pub fn num_bins(&self) -> usize {
        self.0.len() - 1
    }

    /// Bin which a value falls into
    pub fn bin(&self, x: Float) -> usize {
        let inner_edges = &self.0[1..self.0.len() - 1];
        inner_edges.partition_point(|&edge| edge <= x)
    }

    /// Edges, in increasing order
    pub fn edges(&self) -> &[Float] {
        &self.0
    }
}

/// Coordinates of an event mixing bin
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MixingBin {
    /// Vertex z bin
    pub vertex_z: usize,

    /// Multiplicity bin
    pub multiplicity: usize,
}

/// Event similarity classes used for mixing
#[derive(Clone, Debug, PartialEq)]
pub struct MixingBinning {
    vertex_z: BinEdges,
    multiplicity: BinEdges,
}
//
impl MixingBinning {
    /// Set up binning from vertex z and multiplicity edges
    pub fn new(vertex_z: BinEdges, multiplicity: BinEdges) -> Self {
        Self {
            vertex_z,
            multiplicity,
        }
    }

    /// Bin of an event
    pub fn bin(&self, event: &Event) -> MixingBin {
        MixingBin {
            vertex_z: self.vertex_z.bin(event.pos_z),
            multiplicity: self.multiplicity.bin(event.multiplicity as Float),
        }
    }

    /// Sort events into per-bin pools, keeping their relative order
    pub fn pools<'ev>(
        &self,
        events: impl IntoIterator<Item = &'ev Event>,
    ) -> BTreeMap<MixingBin, Vec<&'ev Event>> {
        let mut pools = BTreeMap::<_, Vec<_>>::new();
        for event in events {
            pools.entry(self.bin(event)).or_default().push(event);
        }
        pools
    }
}

/// Running anchor bookkeeping of the event mixer
///
/// The depth counts how many partner events were mixed with the current
/// anchor event. It goes back to zero whenever the anchor changes.
///
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MixingState {
    anchor: Option<EventId>,
    depth: usize,
}
//
impl MixingState {
    /// Start from a blank state
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to an anchor event, resetting the depth if it changed
    pub fn set_anchor(&mut self, anchor: EventId) {
        if self.anchor != Some(anchor) {
            self.anchor = Some(anchor);
            self.depth = 0;
        }
    }

    /// Number of partners mixed with the current anchor so far
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Record that a partner was mixed with the current anchor
    fn increment(&mut self) {
        self.depth += 1;
    }
}

/// Event mixing configuration
#[derive(Clone, Debug, PartialEq)]
pub struct EventMixer {
    binning: MixingBinning,
    depth: usize,
    window: usize,
}
//
impl EventMixer {
    /// Set up event mixing
    ///
    /// Each anchor is mixed with at most `depth` partners, searched among
    /// the `window` events which follow it in its bin.
    ///
    pub fn new(binning: MixingBinning, depth: usize, window: usize) -> Self {
        Self {
            binning,
            depth,
            window,
        }
    }

    /// Mix the events of a source for one pair type
    pub fn pair_events(
        &self,
        source: &(impl EventSource + PhotonSource),
        gate: &EventGate,
        cuts: &CutSets,
        layout: &BucketLayout,
        storage: &mut BucketStorage,
    ) {
        let mut state = MixingState::new();
        let pool_events = source.mixing_events(gate);
        let pools = self.binning.pools(pool_events);
        log::debug!(
            "{}: mixing {} bins",
            layout.pair_type(),
            pools.len()
        );
        for (bin, pool) in &pools {
            log::trace!("mixing bin {:?} with {} events", bin, pool.len());
            self.mix_pool(source, pool, cuts, layout, storage, &mut state);
        }
    }

    /// Mix the events of one bin, in pool order
    pub fn mix_pool(
        &self,
        source: &impl PhotonSource,
        pool: &[&Event],
        cuts: &CutSets,
        layout: &BucketLayout,
        storage: &mut BucketStorage,
        state: &mut MixingState,
    ) {
        let pair_type = layout.pair_type();
        for (i, &anchor) in pool.iter().enumerate() {
            state.set_anchor(anchor.id);
            for &partner in pool[i + 1..].iter().take(self.window) {
                if state.depth() >= self.depth {
                    break;
                }
                if anchor.id == partner.id || !Self::can_mix(pair_type, anchor, partner) {
                    continue;
                }
                mix_event_pair(source, anchor, partner, cuts, layout, storage);
                storage.count_mixed_event_pair();
                state.increment();
            }
        }
    }

    /// Truth that both events can contribute pairs of a given type
    ///
    /// Cross-subsystem pair types also need both subsystems to have been
    /// read out in each event.
    ///
    fn can_mix(pair_type: PairType, event1: &Event, event2: &Event) -> bool {
        [event1, event2].iter().all(|event| {
            pair_type.has_min_candidates(event)
                && (pair_type.is_symmetric() || pair_type.has_readout(event))
        })
    }
}

/// Pair every photon of the first event with every photon of the second one
///
/// The first event provides the photons of the pair type's first subsystem,
/// the second event those of its second subsystem.
///
fn mix_event_pair(
    source: &impl PhotonSource,
    event1: &Event,
    event2: &Event,
    cuts: &CutSets,
    layout: &BucketLayout,
    storage: &mut BucketStorage,
) {
    let pair_type = layout.pair_type();
    let (first, second) = pair_type.subsystems();
    let photons1 = source.photons(first, event1.id);
    let photons2 = source.photons(second, event2.id);
    let (cuts1, cuts2) = (cuts.get(first), cuts.get(second));

    for comb in layout.combinations() {
        let (cut1, cut2) = (&cuts1[comb.cut1], &cuts2[comb.cut2]);
        for g1 in photons1 {
            for g2 in photons2 {
                if !selection::is_selected_pair(pair_type, g1, g2, cut1, cut2) {
                    continue;
                }
                match ObservableRecord::new(g1, g2) {
                    Some(record) => storage.fill(comb.slot, PairKind::Mixed, &record),
                    None => storage.count_degenerate(PairKind::Mixed),
                }
            }
        }
    }
}
