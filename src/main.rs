//! photon_hbt: Two-photon femtoscopy of heavy-ion collision events
//!
//!
//! # Introduction (for the physicist)
//!
//! This program measures Hanbury Brown-Twiss correlations between pairs of
//! photons. Photon candidates come from three detector subsystems: photon
//! conversions in the tracker (PCM), and the PHOS and EMCal calorimeters.
//!
//! For every enabled combination of subsystems and every combination of
//! photon quality cuts, pairs of photons from the same event are compared
//! against pairs of photons from different but similar events ("event
//! mixing"), which provides the uncorrelated reference. Pairs are
//! characterized by their invariant relative momentum qinv, its projections
//! on the out-side-long axes, and their average transverse momentum kt.
//!
//!
//! # Introduction (for the computer guy)
//!
//! The program is a batch pipeline:
//!
//! * read in the configuration and resolve photon cuts by name
//! * create one histogram bucket per valid cut combination
//! * produce the collision events to be analyzed
//! * for every enabled pair type, pair photons within each event, then
//!   across events of the same mixing bin
//! * then display / store the results.
//!
//! Pair types share no state, so they may be processed in parallel.

#![warn(missing_docs)]

mod config;
mod event;
mod evgen;
mod histograms;
mod kinematics;
mod mixing;
mod momentum;
mod numeric;
mod output;
mod pairtype;
mod photon;
mod photoncut;
mod random;
mod same_event;
mod scheduling;
mod selection;
#[cfg(test)]
mod testing;

use clap::Parser;
use eyre::WrapErr;

use crate::{
    config::Configuration, evgen::EventGenerator, histograms::HistogramRegistry,
    photoncut::{BuiltinCatalog, CutSets},
    random::RandomGenerator,
};

use std::{path::PathBuf, time::Instant};

/// We'll use eyre's type-erased result type throughout the application
type Result<T> = eyre::Result<T>;

/// Photon HBT correlation analysis
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "hbt.cfg")]
    config: PathBuf,

    /// Directory where result files are written
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Override the configured event generator seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the configured number of events
    #[arg(long)]
    events: Option<usize>,
}

/// This will act as our main function, with suitable error handling
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // ### CONFIGURATION READOUT ###

    let mut cfg =
        Configuration::load(&args.config).wrap_err("Failed to load the configuration")?;
    if let Some(seed) = args.seed {
        log::info!("Generator seed overridden to {}", seed);
        cfg.seed = seed;
    }
    if let Some(events) = args.events {
        log::info!("Number of events overridden to {}", events);
        cfg.num_events = events;
    }

    // Unknown cut names are fatal, before any event is processed
    let cuts = CutSets::resolve(&BuiltinCatalog, |subsystem| cfg.cut_names(subsystem))
        .wrap_err("Failed to set up the photon cuts")?;

    // ### ANALYSIS INITIALIZATION ###

    // NOTE: The clock starts after configuration I/O, to avoid IO-induced
    //       timing fluctuations
    let saved_time = Instant::now();

    let mut registry = HistogramRegistry::new(&cfg.pair_types, &cuts);
    log::info!("Created {} histogram buckets", registry.num_buckets());

    let mut rng = RandomGenerator::new(cfg.seed);
    let store = EventGenerator::new(cfg.num_events)
        .generate(&mut rng)
        .wrap_err("Failed to generate events")?;
    if store.is_empty() {
        log::warn!("No event to analyze");
    }

    let gate = cfg.event_gate();
    let mixer = cfg.event_mixer();

    // ### ANALYSIS EXECUTION ###

    // This kernel fills every histogram of one pair type
    scheduling::run_analysis(registry.tables_mut(), |layout, storage| {
        same_event::pair_events(&store, &gate, &cuts, layout, storage);
        mixer.pair_events(&store, &gate, &cuts, layout, storage);
    });

    // ### RESULTS DISPLAY AND STORAGE ###

    let elapsed_time = saved_time.elapsed();
    output::dump_results(&cfg, &registry, elapsed_time, &args.output_dir)
        .wrap_err("Failed to output the results")?;

    Ok(())
}
