//! This module takes care of scheduling the analysis work, encapsulating use
//! of multiple threads and anything else that will come in the future

#[cfg(not(feature = "multi-threading"))]
mod sequential;
#[cfg(feature = "multi-threading")]
mod multi_threading;

use crate::histograms::{BucketLayout, BucketStorage, PairTypeHistograms};

/// Run an analysis kernel over every pair type, in the manner that was
/// configured at build time.
///
/// The kernel receives the bucket layout and histogram storage of one pair
/// type. Pair types share no mutable state, so the result does not depend on
/// the order in which they are processed.
///
pub fn run_analysis(
    tables: &mut [PairTypeHistograms],
    kernel: impl Send + Sync + Fn(&BucketLayout, &mut BucketStorage),
) {
    // ...in sequential mode
    #[cfg(not(feature = "multi-threading"))]
    sequential::run_analysis_impl(tables, kernel);

    // ...in multi-threaded mode
    #[cfg(feature = "multi-threading")]
    multi_threading::run_analysis_impl(tables, kernel);
}
