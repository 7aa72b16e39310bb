//! This module is in charge of outputting the final analysis results to the
//! log and to various files

use crate::{
    config::Configuration,
    histograms::{
        BucketKey, BucketStorage, EventHistograms, Histogram1D, HistogramRegistry, PairKind,
        PairTypeHistograms, SparseHistogram,
    },
    numeric::{reals, Float},
    photon::Subsystem,
    selection::EventStage,
    Result,
};

use eyre::WrapErr;

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
    time::Duration,
};

/// Number of significant digits in file output
const SIG_DIGITS: usize = (reals::DIGITS - 1) as usize;

/// Names of the pair observables, in histogram axis order
const OBSERVABLE_NAMES: [&str; 5] = ["qinv", "qlong", "qout", "qside", "kt"];

/// Output the analysis results to the log and to disk
pub fn dump_results(
    cfg: &Configuration,
    registry: &HistogramRegistry,
    elapsed_time: Duration,
    output_dir: &Path,
) -> Result<()> {
    // Print out a short summary
    for table in registry.tables() {
        log_summary(table);
    }

    // Compute a timestamp of when the run ended
    let timestamp = timestamp(time::OffsetDateTime::now_utc())?;

    // Write the run summary and per-bucket statistics
    let data_path = output_dir.join("hbt.data");
    let mut data_file = create(&data_path)?;
    write_data(&mut data_file, cfg, registry, &timestamp, elapsed_time)
        .and_then(|()| data_file.flush())
        .wrap_err_with(|| format!("Failed to write {}", data_path.display()))?;

    // Write the non-empty histogram bins
    let hist_path = output_dir.join("hbt.hist");
    let mut hist_file = create(&hist_path)?;
    write_histograms(&mut hist_file, registry)
        .and_then(|()| hist_file.flush())
        .wrap_err_with(|| format!("Failed to write {}", hist_path.display()))?;

    log::info!(
        "Results written to {} and {}",
        data_path.display(),
        hist_path.display()
    );
    Ok(())
}

/// Format the time at which a run ended
fn timestamp(when: time::OffsetDateTime) -> Result<String> {
    let format = time::macros::format_description!(
        "[day]-[month repr:short]-[year]   [hour]:[minute]:[second]"
    );
    when.format(format).wrap_err("Failed to format the timestamp")
}

/// Create an output file
fn create(path: &Path) -> Result<BufWriter<File>> {
    let file =
        File::create(path).wrap_err_with(|| format!("Could not create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Log the headline numbers of a pair type
fn log_summary(table: &PairTypeHistograms) {
    let layout = table.layout();
    let storage = table.storage();
    log::info!(
        "{}: {} accepted events, {} mixed event pairs",
        layout.pair_type(),
        storage.events().stage_count(EventStage::VertexAccepted),
        storage.mixed_event_pairs()
    );
    for comb in layout.combinations() {
        let (name1, name2) = layout.names(comb.slot);
        log::info!(
            "{}: {}_{}: {} same-event pairs, {} mixed-event pairs",
            layout.pair_type(),
            name1,
            name2,
            storage.histogram(comb.slot, PairKind::Same).entries(),
            storage.histogram(comb.slot, PairKind::Mixed).entries()
        );
    }
}

/// Write the run summary
fn write_data(
    out: &mut impl Write,
    cfg: &Configuration,
    registry: &HistogramRegistry,
    timestamp: &str,
    elapsed_time: Duration,
) -> io::Result<()> {
    writeln_3p(out, timestamp)?;
    writeln_3p(out, ("Elapsed time (s)", elapsed_time.as_secs_f64() as Float))?;
    writeln_3p(out, ("Number of events", cfg.num_events))?;
    writeln_3p(out, ("Generator seed", cfg.seed))?;
    writeln_3p(out, ("Max |vertex z| (cm)", cfg.max_abs_vertex_z))?;
    writeln_3p(out, ("Mixing depth", cfg.mixing_depth))?;
    writeln_3p(out, ("Mixing window", cfg.mixing_window))?;
    for subsystem in Subsystem::ALL {
        let cuts = cfg.cut_names(subsystem).join(",");
        writeln_3p(out, (&format!("{} cuts", subsystem)[..], &cuts[..]))?;
    }
    writeln_3p(out, ("Number of buckets", registry.num_buckets()))?;

    for table in registry.tables() {
        let layout = table.layout();
        let storage = table.storage();
        writeln_3p(out, "---------------------------------------------")?;
        writeln_3p(out, layout.pair_type().name())?;
        write_event_counts(out, storage.events())?;
        write_pair_counts(out, storage)?;
        for comb in layout.combinations() {
            let (name1, name2) = layout.names(comb.slot);
            for kind in [PairKind::Same, PairKind::Mixed] {
                let key = BucketKey {
                    pair_type: layout.pair_type(),
                    cut1: comb.cut1,
                    cut2: comb.cut2,
                    kind,
                };
                if let Some(hist) = registry.get(&key) {
                    let label = format!("{}_{} {}", name1, name2, kind.name());
                    write_bucket(out, &label, hist)?;
                }
            }
        }
    }
    Ok(())
}

/// Write how many events reached each selection stage
fn write_event_counts(out: &mut impl Write, events: &EventHistograms) -> io::Result<()> {
    for stage in EventStage::ALL {
        writeln_3p(out, (stage.label(), events.stage_count(stage)))?;
    }
    Ok(())
}

/// Write the pair-level counters of a pair type
fn write_pair_counts(out: &mut impl Write, storage: &BucketStorage) -> io::Result<()> {
    writeln_3p(out, ("Mixed event pairs", storage.mixed_event_pairs()))?;
    for kind in [PairKind::Same, PairKind::Mixed] {
        let label = format!("Degenerate {} pairs", kind.name());
        writeln_3p(out, (&label[..], storage.degenerate(kind)))?;
    }
    Ok(())
}

/// Write the statistics of one bucket
fn write_bucket(out: &mut impl Write, label: &str, hist: &SparseHistogram) -> io::Result<()> {
    writeln_3p(out, (label, hist.entries()))?;
    writeln_3p(out, ("  out of range", hist.out_of_range()))?;
    if let Some(means) = hist.means() {
        for (name, &mean) in OBSERVABLE_NAMES.iter().zip(means.iter()) {
            writeln_3p(out, (&format!("  mean {}", name)[..], mean))?;
        }
    }
    Ok(())
}

/// Write the non-empty bins of every histogram, one bin per line
fn write_histograms(out: &mut impl Write, registry: &HistogramRegistry) -> io::Result<()> {
    for table in registry.tables() {
        let layout = table.layout();
        let storage = table.storage();
        let pair_type = layout.pair_type().name();

        let events = storage.events();
        write_histogram_1d(out, &format!("{} zvtx before", pair_type), &events.z_before)?;
        write_histogram_1d(out, &format!("{} zvtx after", pair_type), &events.z_after)?;

        for comb in layout.combinations() {
            let (name1, name2) = layout.names(comb.slot);
            for kind in [PairKind::Same, PairKind::Mixed] {
                let hist = storage.histogram(comb.slot, kind);
                writeln!(
                    out,
                    "# {} {}_{} {}: {} count",
                    pair_type,
                    name1,
                    name2,
                    kind.name(),
                    OBSERVABLE_NAMES.join(" "),
                )?;
                for (index, count) in hist.bins() {
                    for (axis, &bin) in hist.axes().iter().zip(index.iter()) {
                        write_engineering(out, axis.center(bin), SIG_DIGITS)?;
                        write!(out, " ")?;
                    }
                    writeln!(out, "{}", count)?;
                }
            }
        }
    }
    Ok(())
}

/// Write the non-empty bins of an event-level histogram
fn write_histogram_1d(out: &mut impl Write, title: &str, hist: &Histogram1D) -> io::Result<()> {
    writeln!(out, "# {}: {} entries, center count", title, hist.entries())?;
    for (bin, &count) in hist.counts().iter().enumerate() {
        if count == 0 {
            continue;
        }
        write_engineering(out, hist.axis().center(bin), SIG_DIGITS)?;
        writeln!(out, " {}", count)?;
    }
    Ok(())
}

/// Text output facility with key-value column alignment
fn writeln_3p(out: &mut impl Write, data: impl Write3p) -> io::Result<()> {
    write!(out, " ")?;
    data.write(out)?;
    writeln!(out)
}

/// Trait implemented by things which can be printed in the results file
trait Write3p: Sized {
    /// Write down `self` to the output
    fn write(self, out: &mut impl Write) -> io::Result<()>;
}

impl Write3p for &str {
    // Strings work in the usual way
    fn write(self, out: &mut impl Write) -> io::Result<()> {
        write!(out, "{}", self)
    }
}

impl Write3p for usize {
    // Integers work in the usual way too
    fn write(self, out: &mut impl Write) -> io::Result<()> {
        write!(out, "{}", self)
    }
}

impl Write3p for u64 {
    fn write(self, out: &mut impl Write) -> io::Result<()> {
        write!(out, "{}", self)
    }
}

impl Write3p for Float {
    // Close approximation of C's %g
    fn write(self, out: &mut impl Write) -> io::Result<()> {
        write_engineering(out, self, SIG_DIGITS)
    }
}

impl<T: Write3p> Write3p for (&str, T) {
    // Key-value output that uses fixed-size columns for better readability
    fn write(self, out: &mut impl Write) -> io::Result<()> {
        write!(out, "{:<31}: ", self.0)?;
        self.1.write(out)
    }
}

/// Write a floating-point number using "engineering" notation
///
/// Analogous to the %g format of the C printf function, this method switches
/// between naive and scientific notation for floating-point numbers when the
/// number being printed becomes so small that printing leading zeroes could end
/// up larger than the scientific notation, or so large that we would be forced
/// to print more significant digits than requested.
///
fn write_engineering(writer: &mut impl Write, x: Float, sig_digits: usize) -> io::Result<()> {
    let mut precision = sig_digits - 1;
    if x == 0. {
        // Zero is special because you can't take its log
        write!(writer, "0")
    } else {
        // Otherwise, use log to evaluate order of magnitude
        let log_x = x.abs().log10();
        if log_x >= -3. && log_x <= (sig_digits as Float) {
            // Print using naive notation, at a constant number of significant
            // digits. Numbers smaller than 1 get one extra digit since the
            // leading zero does not count as a significant digit.
            precision = (precision as isize - log_x.trunc() as isize) as usize;
            if log_x < 0. {
                precision += 1
            }

            // Trim trailing zeros, but be careful with integer numbers...
            let str_with_zeros = format!("{:.1$}", x, precision);
            if str_with_zeros.contains('.') {
                write!(
                    writer,
                    "{}",
                    str_with_zeros.trim_end_matches('0').trim_end_matches('.')
                )
            } else {
                write!(writer, "{}", str_with_zeros)
            }
        } else {
            // Print using scientific notation
            write!(writer, "{:.1$e}", x, precision)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histograms::Axis;

    fn engineering(x: Float) -> String {
        let mut out = Vec::new();
        write_engineering(&mut out, x, 6).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn engineering_notation() {
        assert_eq!(engineering(0.), "0");
        assert_eq!(engineering(10.), "10");
        assert_eq!(engineering(0.0025), "0.0025");
        assert_eq!(engineering(-1.5), "-1.5");
        assert_eq!(engineering(1.5e-7), "1.50000e-7");
    }

    #[test]
    fn timestamp_format() {
        let when = time::macros::datetime!(2024-03-05 07:08:09 UTC);
        assert_eq!(timestamp(when).unwrap(), "05-Mar-2024   07:08:09");
    }

    #[test]
    fn event_histogram_lists_entries_and_filled_bins() {
        let mut hist = Histogram1D::new(Axis::new(4, 0., 4.));
        hist.fill(1.5);
        hist.fill(1.2);
        hist.fill(-3.);
        let mut out = Vec::new();
        write_histogram_1d(&mut out, "zvtx", &hist).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "# zvtx: 3 entries, center count\n1.5 2\n");
    }

    #[test]
    fn key_value_columns() {
        let mut out = Vec::new();
        writeln_3p(&mut out, ("Mixing depth", 10usize)).unwrap();
        let line = String::from_utf8(out).unwrap();
        assert_eq!(line, format!(" {:<31}: 10\n", "Mixing depth"));
    }
}
