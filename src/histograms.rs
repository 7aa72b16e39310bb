//! Histogram storage for pair observables and event accounting
//!
//! Pair histograms are organized in buckets, one per pair type and valid
//! combination of cuts, each holding a "same event" and a "mixed event"
//! histogram. All buckets are created up front, from the configured cut lists,
//! so that pairing code only ever fills existing storage.

use crate::{
    kinematics::{ObservableRecord, ObservableVector, NUM_OBSERVABLES},
    numeric::Float,
    pairtype::PairType,
    photoncut::CutSets,
    selection::EventStage,
};
use num_traits::Zero;
use std::collections::{BTreeMap, HashMap};

/// Uniformly binned histogram axis
#[derive(Clone, Debug, PartialEq)]
pub struct Axis {
    /// Number of bins
    pub num_bins: usize,

    /// Lower edge of the first bin
    pub min: Float,

    /// Upper edge of the last bin
    pub max: Float,
}
//
impl Axis {
    /// Define an axis
    pub fn new(num_bins: usize, min: Float, max: Float) -> Self {
        assert!(num_bins > 0, "An axis needs at least one bin");
        assert!(min < max, "Axis bounds must be increasing");
        Self { num_bins, min, max }
    }

    /// Bin which a value falls into, if it is in range
    pub fn bin(&self, x: Float) -> Option<usize> {
        if !(x >= self.min && x < self.max) {
            return None;
        }
        let bin = ((x - self.min) / (self.max - self.min) * self.num_bins as Float) as usize;
        Some(bin.min(self.num_bins - 1))
    }

    /// Center of a bin
    pub fn center(&self, bin: usize) -> Float {
        let width = (self.max - self.min) / self.num_bins as Float;
        self.min + (bin as Float + 0.5) * width
    }
}

/// One-dimensional histogram
#[derive(Clone, Debug)]
pub struct Histogram1D {
    axis: Axis,
    counts: Vec<u64>,
    underflow: u64,
    overflow: u64,
}
//
impl Histogram1D {
    /// Create an empty histogram
    pub fn new(axis: Axis) -> Self {
        Self {
            counts: vec![0; axis.num_bins],
            axis,
            underflow: 0,
            overflow: 0,
        }
    }

    /// Record a value
    pub fn fill(&mut self, x: Float) {
        match self.axis.bin(x) {
            Some(bin) => self.counts[bin] += 1,
            None if x < self.axis.min => self.underflow += 1,
            None => self.overflow += 1,
        }
    }

    /// Axis definition
    pub fn axis(&self) -> &Axis {
        &self.axis
    }

    /// In-range bin contents
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Number of recorded values, including out-of-range ones
    pub fn entries(&self) -> u64 {
        self.counts.iter().sum::<u64>() + self.underflow + self.overflow
    }
}

/// Bin coordinates in a sparse histogram
pub type BinIndex = [usize; NUM_OBSERVABLES];

/// Sparse histogram of pair observables
///
/// Only non-empty bins are stored. Fills outside of the axis ranges are only
/// counted, but still enter the entry count and the observable sums.
///
#[derive(Clone, Debug)]
pub struct SparseHistogram {
    axes: [Axis; NUM_OBSERVABLES],
    bins: BTreeMap<BinIndex, u64>,
    entries: u64,
    out_of_range: u64,
    sums: ObservableVector,
}
//
impl SparseHistogram {
    /// Create an empty histogram
    pub fn new(axes: [Axis; NUM_OBSERVABLES]) -> Self {
        Self {
            axes,
            bins: BTreeMap::new(),
            entries: 0,
            out_of_range: 0,
            sums: ObservableVector::zero(),
        }
    }

    /// Record one pair
    pub fn fill(&mut self, record: &ObservableRecord) {
        let values = record.values();
        self.entries += 1;
        self.sums += values;

        let mut index = [0; NUM_OBSERVABLES];
        for ((slot, axis), &x) in index.iter_mut().zip(&self.axes).zip(values.iter()) {
            match axis.bin(x) {
                Some(bin) => *slot = bin,
                None => {
                    self.out_of_range += 1;
                    return;
                }
            }
        }
        *self.bins.entry(index).or_insert(0) += 1;
    }

    /// Axis definitions
    pub fn axes(&self) -> &[Axis; NUM_OBSERVABLES] {
        &self.axes
    }

    /// Non-empty bins, in ascending bin order
    pub fn bins(&self) -> impl Iterator<Item = (&BinIndex, u64)> + '_ {
        self.bins.iter().map(|(index, &count)| (index, count))
    }

    /// Number of recorded pairs
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Number of recorded pairs which fell outside of the axes
    pub fn out_of_range(&self) -> u64 {
        self.out_of_range
    }

    /// Mean of each observable, if any pair was recorded
    pub fn means(&self) -> Option<ObservableVector> {
        (self.entries > 0).then(|| self.sums / self.entries as Float)
    }
}

/// Axes of the pair observable histograms (qinv, qlong, qout, qside, kt)
pub fn pair_axes() -> [Axis; NUM_OBSERVABLES] {
    [
        Axis::new(60, 0., 0.3),
        Axis::new(60, -0.3, 0.3),
        Axis::new(60, -0.3, 0.3),
        Axis::new(60, -0.3, 0.3),
        Axis::new(20, 0., 1.),
    ]
}

/// Where a pair came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PairKind {
    /// Both photons from the same event
    Same,

    /// Photons from two different events
    Mixed,
}
//
impl PairKind {
    /// Suffix used in output names
    pub fn name(self) -> &'static str {
        match self {
            PairKind::Same => "same",
            PairKind::Mixed => "mix",
        }
    }
}

/// Identity of a pair histogram
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey {
    /// Subsystems of the pair
    pub pair_type: PairType,

    /// Index of the first photon's cut in its subsystem's cut list
    pub cut1: usize,

    /// Index of the second photon's cut in its subsystem's cut list
    pub cut2: usize,

    /// Same or mixed event pairs
    pub kind: PairKind,
}

/// Position of a bucket in its pair type's storage
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BucketSlot(usize);

/// Pair of cuts which photon pairs of a pair type are tested against
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CutCombination {
    /// Cut index of the first photon
    pub cut1: usize,

    /// Cut index of the second photon
    pub cut2: usize,

    /// Where the resulting pairs are stored
    pub slot: BucketSlot,
}

/// Valid cut combinations of a pair type, fixed at startup
///
/// Symmetric pair types only get identical cut names on both sides,
/// other pair types get every cut of the first subsystem combined with every
/// cut of the second subsystem.
///
#[derive(Clone, Debug)]
pub struct BucketLayout {
    pair_type: PairType,
    combinations: Vec<CutCombination>,
    names: Vec<(String, String)>,
}
//
impl BucketLayout {
    /// Enumerate the valid cut combinations of a pair type
    pub fn new(pair_type: PairType, cuts: &CutSets) -> Self {
        let (first, second) = pair_type.subsystems();
        let mut combinations = Vec::new();
        let mut names = Vec::new();
        for (cut1, c1) in cuts.get(first).iter().enumerate() {
            for (cut2, c2) in cuts.get(second).iter().enumerate() {
                if pair_type.is_symmetric() && c1.name() != c2.name() {
                    continue;
                }
                combinations.push(CutCombination {
                    cut1,
                    cut2,
                    slot: BucketSlot(names.len()),
                });
                names.push((c1.name().to_owned(), c2.name().to_owned()));
            }
        }
        Self {
            pair_type,
            combinations,
            names,
        }
    }

    /// Pair type of this layout
    pub fn pair_type(&self) -> PairType {
        self.pair_type
    }

    /// Valid cut combinations, first cut index varying slowest
    pub fn combinations(&self) -> &[CutCombination] {
        &self.combinations
    }

    /// Number of buckets
    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    /// Cut names of a bucket
    pub fn names(&self, slot: BucketSlot) -> (&str, &str) {
        let (name1, name2) = &self.names[slot.0];
        (name1, name2)
    }

    /// Find the bucket of a cut combination
    #[cfg(test)]
    pub fn find(&self, cut1: usize, cut2: usize) -> Option<BucketSlot> {
        self.combinations
            .iter()
            .find(|comb| comb.cut1 == cut1 && comb.cut2 == cut2)
            .map(|comb| comb.slot)
    }
}

/// Which vertex distribution to fill
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexFill {
    /// Before event selection
    Before,

    /// After event selection
    After,
}

/// Event accounting of one pair type
#[derive(Clone, Debug)]
pub struct EventHistograms {
    /// Vertex z of the events considered for pairing
    pub z_before: Histogram1D,

    /// Vertex z of the events which passed selection
    pub z_after: Histogram1D,

    stage_counts: [u64; EventStage::COUNT],
}
//
impl EventHistograms {
    fn new() -> Self {
        let z_axis = Axis::new(100, -50., 50.);
        Self {
            z_before: Histogram1D::new(z_axis.clone()),
            z_after: Histogram1D::new(z_axis),
            stage_counts: [0; EventStage::COUNT],
        }
    }

    /// Record that an event reached a selection stage
    pub fn count_stage(&mut self, stage: EventStage) {
        self.stage_counts[stage.index()] += 1;
    }

    /// Record an event's vertex position
    pub fn fill_vertex(&mut self, when: VertexFill, pos_z: Float) {
        match when {
            VertexFill::Before => self.z_before.fill(pos_z),
            VertexFill::After => self.z_after.fill(pos_z),
        }
    }

    /// Number of events which reached a selection stage
    pub fn stage_count(&self, stage: EventStage) -> u64 {
        self.stage_counts[stage.index()]
    }
}

/// Mutable histogram storage of one pair type
#[derive(Clone, Debug)]
pub struct BucketStorage {
    same: Vec<SparseHistogram>,
    mixed: Vec<SparseHistogram>,
    events: EventHistograms,
    degenerate: [u64; 2],
    mixed_event_pairs: u64,
}
//
impl BucketStorage {
    fn new(num_buckets: usize) -> Self {
        let hists = || {
            (0..num_buckets)
                .map(|_| SparseHistogram::new(pair_axes()))
                .collect::<Vec<_>>()
        };
        Self {
            same: hists(),
            mixed: hists(),
            events: EventHistograms::new(),
            degenerate: [0; 2],
            mixed_event_pairs: 0,
        }
    }

    fn kind_index(kind: PairKind) -> usize {
        match kind {
            PairKind::Same => 0,
            PairKind::Mixed => 1,
        }
    }

    /// Record one photon pair into a bucket
    pub fn fill(&mut self, slot: BucketSlot, kind: PairKind, record: &ObservableRecord) {
        self.histogram_mut(slot, kind).fill(record);
    }

    /// Record a photon pair whose observables are undefined
    pub fn count_degenerate(&mut self, kind: PairKind) {
        self.degenerate[Self::kind_index(kind)] += 1;
    }

    /// Record that an event pair was mixed
    pub fn count_mixed_event_pair(&mut self) {
        self.mixed_event_pairs += 1;
    }

    /// Event accounting
    pub fn events(&self) -> &EventHistograms {
        &self.events
    }

    /// Mutable event accounting
    pub fn events_mut(&mut self) -> &mut EventHistograms {
        &mut self.events
    }

    /// Histogram of a bucket
    pub fn histogram(&self, slot: BucketSlot, kind: PairKind) -> &SparseHistogram {
        match kind {
            PairKind::Same => &self.same[slot.0],
            PairKind::Mixed => &self.mixed[slot.0],
        }
    }

    fn histogram_mut(&mut self, slot: BucketSlot, kind: PairKind) -> &mut SparseHistogram {
        match kind {
            PairKind::Same => &mut self.same[slot.0],
            PairKind::Mixed => &mut self.mixed[slot.0],
        }
    }

    /// Number of skipped degenerate pairs
    pub fn degenerate(&self, kind: PairKind) -> u64 {
        self.degenerate[Self::kind_index(kind)]
    }

    /// Number of mixed event pairs
    pub fn mixed_event_pairs(&self) -> u64 {
        self.mixed_event_pairs
    }
}

/// Bucket layout and histogram storage of one pair type
#[derive(Clone, Debug)]
pub struct PairTypeHistograms {
    layout: BucketLayout,
    storage: BucketStorage,
}
//
impl PairTypeHistograms {
    /// Create every bucket of a pair type
    pub fn new(pair_type: PairType, cuts: &CutSets) -> Self {
        let layout = BucketLayout::new(pair_type, cuts);
        let storage = BucketStorage::new(layout.len());
        Self { layout, storage }
    }

    /// Bucket layout
    pub fn layout(&self) -> &BucketLayout {
        &self.layout
    }

    /// Histogram storage
    pub fn storage(&self) -> &BucketStorage {
        &self.storage
    }

    /// Read-only layout alongside writable storage, for filling
    pub fn split_mut(&mut self) -> (&BucketLayout, &mut BucketStorage) {
        (&self.layout, &mut self.storage)
    }
}

/// Every histogram of the analysis, keyed by pair type and cut combination
#[derive(Clone, Debug, Default)]
pub struct HistogramRegistry {
    tables: Vec<PairTypeHistograms>,
    index: HashMap<(PairType, usize, usize), BucketSlot>,
}
//
impl HistogramRegistry {
    /// Create the buckets of every enabled pair type
    pub fn new(pair_types: &[PairType], cuts: &CutSets) -> Self {
        let mut registry = Self::default();
        for &pair_type in pair_types {
            if registry.table(pair_type).is_some() {
                continue;
            }
            let table = PairTypeHistograms::new(pair_type, cuts);
            for comb in table.layout().combinations() {
                registry
                    .index
                    .insert((pair_type, comb.cut1, comb.cut2), comb.slot);
            }
            log::info!(
                "Enabled pairs = {} ({} cut combinations)",
                pair_type,
                table.layout().len()
            );
            registry.tables.push(table);
        }
        registry
    }

    /// Histograms of one pair type
    pub fn table(&self, pair_type: PairType) -> Option<&PairTypeHistograms> {
        self.tables
            .iter()
            .find(|table| table.layout().pair_type() == pair_type)
    }

    /// Histograms of every enabled pair type
    pub fn tables(&self) -> &[PairTypeHistograms] {
        &self.tables
    }

    /// Histograms of every enabled pair type, for filling
    pub fn tables_mut(&mut self) -> &mut [PairTypeHistograms] {
        &mut self.tables
    }

    /// Total number of buckets
    pub fn num_buckets(&self) -> usize {
        self.index.len()
    }

    /// Look up a pair histogram
    pub fn get(&self, key: &BucketKey) -> Option<&SparseHistogram> {
        let slot = *self.index.get(&(key.pair_type, key.cut1, key.cut2))?;
        let table = self.table(key.pair_type)?;
        Some(table.storage().histogram(slot, key.kind))
    }

    /// Record one photon pair
    ///
    /// Returns false if no bucket exists for this key. The pairing kernels
    /// fill through `BucketStorage` instead, which avoids the key lookup.
    ///
    #[cfg(test)]
    pub fn fill(&mut self, key: &BucketKey, record: &ObservableRecord) -> bool {
        let Some(&slot) = self.index.get(&(key.pair_type, key.cut1, key.cut2)) else {
            return false;
        };
        match self
            .tables
            .iter_mut()
            .find(|table| table.layout().pair_type() == key.pair_type)
        {
            Some(table) => {
                table.split_mut().1.fill(slot, key.kind, record);
                true
            }
            None => false,
        }
    }
}
