//! Named photon selections and the catalog they are looked up from

use crate::{
    numeric::Float,
    photon::{Cluster, Payload, PhotonCandidate, Subsystem, V0Leg},
};
use prefix_num_ops::real::*;
use thiserror::Error;

/// Failure to resolve a cut name
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CutError {
    /// The catalog does not know this name for this subsystem
    #[error("unknown {subsystem} cut \"{name}\"")]
    UnknownCut {
        /// Subsystem for which the cut was requested
        subsystem: Subsystem,
        /// Requested cut name
        name: String,
    },
}

/// Requirements on each leg of a conversion photon
#[derive(Clone, Debug, PartialEq)]
pub struct LegCut {
    /// Minimal leg transverse momentum
    pub min_pt: Float,

    /// Maximal leg |eta|
    pub max_abs_eta: Float,

    /// Minimal number of crossed TPC rows
    pub min_tpc_crossed_rows: u16,

    /// Maximal TPC chi² per cluster
    pub max_tpc_chi2_per_cluster: Float,

    /// Accepted TPC electron nσ window
    pub tpc_nsigma_el: (Float, Float),
}
//
impl LegCut {
    /// Leg cut which accepts every leg
    pub fn open() -> Self {
        Self {
            min_pt: 0.,
            max_abs_eta: Float::INFINITY,
            min_tpc_crossed_rows: 0,
            max_tpc_chi2_per_cluster: Float::INFINITY,
            tpc_nsigma_el: (Float::NEG_INFINITY, Float::INFINITY),
        }
    }

    fn accepts(&self, leg: &V0Leg) -> bool {
        leg.pt >= self.min_pt
            && abs(leg.eta) < self.max_abs_eta
            && leg.tpc_crossed_rows >= self.min_tpc_crossed_rows
            && leg.tpc_chi2_per_cluster < self.max_tpc_chi2_per_cluster
            && (self.tpc_nsigma_el.0..=self.tpc_nsigma_el.1).contains(&leg.tpc_nsigma_el)
    }
}

/// Requirements on a calorimeter cluster
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterCut {
    /// Minimal cluster energy
    pub min_energy: Float,

    /// Minimal number of cells
    pub min_cells: u16,

    /// Accepted M02 window
    pub m02: (Float, Float),

    /// Maximal |time|
    pub max_abs_time: Float,
}
//
impl ClusterCut {
    /// Cluster cut which accepts every cluster
    pub fn open() -> Self {
        Self {
            min_energy: 0.,
            min_cells: 0,
            m02: (Float::NEG_INFINITY, Float::INFINITY),
            max_abs_time: Float::INFINITY,
        }
    }

    fn accepts(&self, cluster: &Cluster) -> bool {
        cluster.energy >= self.min_energy
            && cluster.num_cells >= self.min_cells
            && (self.m02.0..=self.m02.1).contains(&cluster.m02)
            && abs(cluster.time) < self.max_abs_time
    }
}

/// Subsystem-specific part of a photon cut
#[derive(Clone, Debug, PartialEq)]
pub enum Criteria {
    /// Applied to both legs of a conversion photon
    Legs(LegCut),

    /// Applied to the cluster of a calorimeter photon
    Cluster(ClusterCut),
}

/// Named selection of photon candidates from one subsystem
#[derive(Clone, Debug, PartialEq)]
pub struct PhotonCut {
    name: String,
    subsystem: Subsystem,
    pt_range: (Float, Float),
    max_abs_eta: Float,
    criteria: Criteria,
}
//
impl PhotonCut {
    /// Build a cut which accepts every candidate of a subsystem
    pub fn new(name: impl Into<String>, subsystem: Subsystem) -> Self {
        let criteria = match subsystem {
            Subsystem::Pcm => Criteria::Legs(LegCut::open()),
            Subsystem::Phos | Subsystem::Emc => Criteria::Cluster(ClusterCut::open()),
        };
        Self {
            name: name.into(),
            subsystem,
            pt_range: (0., Float::INFINITY),
            max_abs_eta: Float::INFINITY,
            criteria,
        }
    }

    /// Restrict the candidate transverse momentum
    pub fn with_pt_range(mut self, min: Float, max: Float) -> Self {
        self.pt_range = (min, max);
        self
    }

    /// Restrict the candidate pseudorapidity
    pub fn with_max_abs_eta(mut self, max_abs_eta: Float) -> Self {
        self.max_abs_eta = max_abs_eta;
        self
    }

    /// Set the leg requirements (conversion photons only)
    pub fn with_legs(mut self, legs: LegCut) -> Self {
        assert_eq!(self.subsystem, Subsystem::Pcm, "Only PCM photons have legs");
        self.criteria = Criteria::Legs(legs);
        self
    }

    /// Set the cluster requirements (calorimeter photons only)
    pub fn with_cluster(mut self, cluster: ClusterCut) -> Self {
        assert_ne!(self.subsystem, Subsystem::Pcm, "PCM photons have no cluster");
        self.criteria = Criteria::Cluster(cluster);
        self
    }

    /// Name under which this cut was configured
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subsystem whose candidates this cut applies to
    pub fn subsystem(&self) -> Subsystem {
        self.subsystem
    }

    /// Decide whether a candidate passes this cut
    ///
    /// Candidates from another subsystem never pass.
    ///
    pub fn is_selected(&self, photon: &PhotonCandidate) -> bool {
        if photon.subsystem() != self.subsystem {
            return false;
        }
        if photon.pt < self.pt_range.0 || photon.pt > self.pt_range.1 {
            return false;
        }
        if abs(photon.eta) >= self.max_abs_eta {
            return false;
        }
        match (&self.criteria, &photon.payload) {
            (Criteria::Legs(cut), Payload::Pcm(legs)) => legs.iter().all(|leg| cut.accepts(leg)),
            (Criteria::Cluster(cut), Payload::Phos(cluster) | Payload::Emc(cluster)) => {
                cut.accepts(cluster)
            }
            _ => false,
        }
    }
}

/// Source of named cut definitions
pub trait CutCatalog {
    /// Look up a cut by name for a given subsystem
    fn resolve(&self, subsystem: Subsystem, name: &str) -> Result<PhotonCut, CutError>;
}

/// Catalog of the cuts that this program knows about
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinCatalog;
//
impl CutCatalog for BuiltinCatalog {
    fn resolve(&self, subsystem: Subsystem, name: &str) -> Result<PhotonCut, CutError> {
        let cut = PhotonCut::new(name, subsystem);
        let cut = match (subsystem, name) {
            (Subsystem::Pcm, "analysis") => cut
                .with_pt_range(0.1, 1e10)
                .with_max_abs_eta(0.9)
                .with_legs(LegCut {
                    min_pt: 0.05,
                    max_abs_eta: 0.9,
                    min_tpc_crossed_rows: 40,
                    max_tpc_chi2_per_cluster: 4.,
                    tpc_nsigma_el: (-3., 3.),
                }),
            (Subsystem::Pcm, "qc") => cut
                .with_pt_range(0.02, 1e10)
                .with_max_abs_eta(0.9)
                .with_legs(LegCut {
                    min_tpc_crossed_rows: 40,
                    tpc_nsigma_el: (-3., 3.),
                    ..LegCut::open()
                }),
            (Subsystem::Pcm, "nocut") => cut.with_max_abs_eta(0.9),
            (Subsystem::Phos, "test02") => cut.with_cluster(ClusterCut {
                min_energy: 0.2,
                min_cells: 2,
                ..ClusterCut::open()
            }),
            (Subsystem::Phos, "test03") => cut.with_cluster(ClusterCut {
                min_energy: 0.3,
                min_cells: 3,
                ..ClusterCut::open()
            }),
            (Subsystem::Phos, "nocut") => cut,
            (Subsystem::Emc, "standard") => cut.with_max_abs_eta(0.7).with_cluster(ClusterCut {
                min_energy: 0.7,
                min_cells: 1,
                m02: (0.1, 0.7),
                max_abs_time: 20.,
            }),
            (Subsystem::Emc, "nocut") => cut,
            _ => {
                return Err(CutError::UnknownCut {
                    subsystem,
                    name: name.to_owned(),
                })
            }
        };
        Ok(cut)
    }
}

/// Cuts resolved for every subsystem, in configured order
#[derive(Clone, Debug, Default)]
pub struct CutSets([Vec<PhotonCut>; Subsystem::COUNT]);
//
impl CutSets {
    /// Resolve the configured cut names of every subsystem
    ///
    /// Fails on the first name that the catalog does not know.
    ///
    pub fn resolve<'names>(
        catalog: &impl CutCatalog,
        mut names: impl FnMut(Subsystem) -> &'names [String],
    ) -> Result<Self, CutError> {
        let mut sets = Self::default();
        for subsystem in Subsystem::ALL {
            let cuts = &mut sets.0[subsystem.index()];
            for name in names(subsystem) {
                log::info!("add {} cut : {}", subsystem, name);
                cuts.push(catalog.resolve(subsystem, name)?);
            }
            log::info!("Number of {} cuts = {}", subsystem, cuts.len());
        }
        Ok(sets)
    }

    /// Cuts configured for a subsystem
    pub fn get(&self, subsystem: Subsystem) -> &[PhotonCut] {
        &self.0[subsystem.index()]
    }
}
