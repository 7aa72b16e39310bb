//! Mechanism for loading and sharing the analysis configuration

use crate::{
    mixing::{BinEdges, EventMixer, MixingBinning},
    numeric::Float,
    pairtype::PairType,
    photon::Subsystem,
    selection::EventGate,
    Result,
};

use eyre::{ensure, eyre, WrapErr};

use std::{fs, path::Path, str::FromStr};

/// Analysis configuration
pub struct Configuration {
    /// Pair types to be processed, in canonical order
    pub pair_types: Vec<PairType>,

    /// Cut names of each subsystem, in configured order
    cut_names: [Vec<String>; Subsystem::COUNT],

    /// Maximal number of partner events mixed with each event
    pub mixing_depth: usize,

    /// Number of following events searched for mixing partners
    pub mixing_window: usize,

    /// Vertex z bin edges for event mixing
    pub vertex_z_edges: BinEdges,

    /// Multiplicity bin edges for event mixing
    pub multiplicity_edges: BinEdges,

    /// Maximal accepted |vertex z| (cm)
    pub max_abs_vertex_z: Float,

    /// Number of events to be generated
    pub num_events: usize,

    /// Seed of the event generator
    pub seed: u64,
}
//
impl Configuration {
    /// Load the configuration from a file, check it, and log it
    pub fn load(file_name: impl AsRef<Path>) -> Result<Self> {
        let file_name = file_name.as_ref();
        let config_str = fs::read_to_string(file_name)
            .wrap_err_with(|| format!("Could not read {}", file_name.display()))?;
        let config = Self::parse(&config_str)?;
        config.print();
        Ok(config)
    }

    /// Decode and check configuration file contents
    pub fn parse(config_str: &str) -> Result<Self> {
        // We will iterate over the configuration items. These are the first
        // non-whitespace chunk of text on each line, the rest of the line is
        // free-form commentary. Blank lines are ignored.
        let mut config_iter = config_str
            .lines()
            .filter_map(|line| line.split_whitespace().next());

        // This closure fetches the next configuration item, tagging it with
        // the name of the configuration field which it is supposed to fill to
        // ease error reporting, and handling unexpected end-of-file too.
        let mut next_item = |name: &'static str| -> Result<ConfigItem> {
            config_iter
                .next()
                .map(|data| ConfigItem::new(name, data))
                .ok_or_else(|| eyre!("Missing configuration of {}", name))
        };

        // Pair type switches come first, in canonical pair type order
        let mut pair_types = Vec::new();
        for pair_type in PairType::ALL {
            if next_item(switch_name(pair_type))?.parse_bool()? {
                pair_types.push(pair_type);
            }
        }

        // Decode the other configuration items into concrete values
        let config = Configuration {
            pair_types,
            cut_names: [
                next_item("pcm_cuts")?.parse_names(),
                next_item("phos_cuts")?.parse_names(),
                next_item("emc_cuts")?.parse_names(),
            ],
            mixing_depth: next_item("mixing_depth")?.parse::<usize>()?,
            mixing_window: next_item("mixing_window")?.parse::<usize>()?,
            vertex_z_edges: next_item("vertex_z_edges")?.parse_edges()?,
            multiplicity_edges: next_item("multiplicity_edges")?.parse_edges()?,
            max_abs_vertex_z: next_item("max_abs_vertex_z")?.parse::<Float>()?,
            num_events: next_item("num_events")?.parse::<usize>()?,
            seed: next_item("seed")?.parse::<u64>()?,
        };

        // The same cut name twice would make two buckets indistinguishable
        for subsystem in Subsystem::ALL {
            let names = config.cut_names(subsystem);
            for (idx, name) in names.iter().enumerate() {
                ensure!(
                    !names[..idx].contains(name),
                    "{} cut {} is configured twice",
                    subsystem,
                    name
                );
            }
        }

        ensure!(
            config.max_abs_vertex_z > 0.,
            "The vertex z acceptance must be positive"
        );
        ensure!(
            config.mixing_window > 0,
            "The mixing window must contain at least one event"
        );
        if config.pair_types.is_empty() {
            log::warn!("No pair type is enabled, only events will be generated");
        }

        Ok(config)
    }

    /// Configured cut names of a subsystem
    pub fn cut_names(&self, subsystem: Subsystem) -> &[String] {
        &self.cut_names[subsystem.index()]
    }

    /// Event quality gate described by this configuration
    pub fn event_gate(&self) -> EventGate {
        EventGate::new(self.max_abs_vertex_z)
    }

    /// Event mixer described by this configuration
    pub fn event_mixer(&self) -> EventMixer {
        EventMixer::new(
            MixingBinning::new(self.vertex_z_edges.clone(), self.multiplicity_edges.clone()),
            self.mixing_depth,
            self.mixing_window,
        )
    }

    /// Log the configuration
    pub fn print(&self) {
        for pair_type in PairType::ALL {
            log::info!(
                "{:<19}: {}",
                switch_name(pair_type),
                self.pair_types.contains(&pair_type)
            );
        }
        for subsystem in Subsystem::ALL {
            log::info!(
                "{:<19}: {}",
                format!("{} cuts", subsystem),
                self.cut_names(subsystem).join(",")
            );
        }
        log::info!("{:<19}: {}", "mixing depth", self.mixing_depth);
        log::info!("{:<19}: {}", "mixing window", self.mixing_window);
        for (name, edges) in [
            ("vertex z bins", &self.vertex_z_edges),
            ("multiplicity bins", &self.multiplicity_edges),
        ] {
            log::info!("{:<19}: {} {:?}", name, edges.num_bins(), edges.edges());
        }
        log::info!("{:<19}: {}", "max |vertex z|", self.max_abs_vertex_z);
        log::info!("{:<19}: {}", "events", self.num_events);
        log::info!("{:<19}: {}", "seed", self.seed);
    }
}

/// Name of the configuration item which enables a pair type
fn switch_name(pair_type: PairType) -> &'static str {
    match pair_type {
        PairType::PcmPcm => "process_pcm_pcm",
        PairType::PhosPhos => "process_phos_phos",
        PairType::EmcEmc => "process_emc_emc",
        PairType::PcmPhos => "process_pcm_phos",
        PairType::PcmEmc => "process_pcm_emc",
        PairType::PhosEmc => "process_phos_emc",
    }
}

/// A value from the configuration file, tagged with the struct field which it
/// is supposed to map for error reporting purposes.
struct ConfigItem<'data> {
    name: &'static str,
    data: &'data str,
}
//
impl<'data> ConfigItem<'data> {
    /// Build a config item from a struct field tag and raw iterator data
    fn new(name: &'static str, data: &'data str) -> Self {
        Self { name, data }
    }

    /// Parse this data using Rust's standard parsing logic
    fn parse<T: FromStr>(self) -> Result<T>
    where
        <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
    {
        self.data
            .parse::<T>()
            .wrap_err_with(|| format!("Could not parse configuration of {}", self.name))
    }

    /// Parse this data using special logic which handles Fortran's bool syntax
    fn parse_bool(self) -> Result<bool> {
        match self.data.to_lowercase().as_str() {
            // Handle FORTRAN booleans as a special case
            ".true." => Ok(true),
            ".false." => Ok(false),
            // Delegate other booleans to the standard Rust parser
            _ => self.parse::<bool>(),
        }
    }

    /// Parse a comma-separated list of names, where "none" is an empty list
    fn parse_names(self) -> Vec<String> {
        if self.data.eq_ignore_ascii_case("none") {
            return Vec::new();
        }
        self.data
            .split(',')
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Parse a comma-separated list of bin edges
    fn parse_edges(self) -> Result<BinEdges> {
        let edges = self
            .data
            .split(',')
            .map(|edge| ConfigItem::new(self.name, edge).parse::<Float>())
            .collect::<Result<Vec<_>>>()?;
        BinEdges::new(edges)
            .wrap_err_with(|| format!("Invalid configuration of {}", self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
.true.      process_pcm_pcm
.false.     process_phos_phos
false       process_emc_emc

.true.      process_pcm_phos
.false.     process_pcm_emc
.false.     process_phos_emc
analysis,qc,nocut    PCM cuts
test02,test03        PHOS cuts
none                 EMC cuts
10          mixing depth
1000        mixing window
-10,-8,-6,-4,-2,0,2,4,6,8,10      vertex z bins
0,10,20,40,60,80,100,200,1e10     multiplicity bins
10          max |vertex z|
5000        events
42          seed
";

    #[test]
    fn sample_configuration() {
        let cfg = Configuration::parse(SAMPLE).unwrap();
        assert_eq!(cfg.pair_types, [PairType::PcmPcm, PairType::PcmPhos]);
        assert_eq!(cfg.cut_names(Subsystem::Pcm), ["analysis", "qc", "nocut"]);
        assert_eq!(cfg.cut_names(Subsystem::Phos), ["test02", "test03"]);
        assert!(cfg.cut_names(Subsystem::Emc).is_empty());
        assert_eq!(cfg.mixing_depth, 10);
        assert_eq!(cfg.mixing_window, 1000);
        assert_eq!(cfg.vertex_z_edges.num_bins(), 10);
        assert_eq!(cfg.multiplicity_edges.num_bins(), 8);
        assert_eq!(cfg.max_abs_vertex_z, 10.);
        assert_eq!(cfg.num_events, 5000);
        assert_eq!(cfg.seed, 42);
    }

    #[test]
    fn missing_item_is_reported() {
        let truncated = SAMPLE.lines().take(10).collect::<Vec<_>>().join("\n");
        let err = Configuration::parse(&truncated).err().unwrap();
        assert_eq!(err.to_string(), "Missing configuration of mixing_depth");
    }

    #[test]
    fn bad_bool_is_reported() {
        let bad = SAMPLE.replacen(".true.", "yes", 1);
        let err = Configuration::parse(&bad).err().unwrap();
        assert_eq!(
            err.to_string(),
            "Could not parse configuration of process_pcm_pcm"
        );
    }

    #[test]
    fn unsorted_edges_are_rejected() {
        let bad = SAMPLE.replace("-10,-8,-6", "-10,-6,-8");
        assert!(Configuration::parse(&bad).is_err());
    }

    #[test]
    fn duplicate_cut_names_are_rejected() {
        let bad = SAMPLE.replace("analysis,qc,nocut", "analysis,qc,analysis");
        let err = Configuration::parse(&bad).err().unwrap();
        assert_eq!(err.to_string(), "PCM cut analysis is configured twice");
    }
}
