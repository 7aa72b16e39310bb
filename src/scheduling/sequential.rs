//! Sequential back-end of the analysis

use crate::histograms::{BucketLayout, BucketStorage, PairTypeHistograms};

/// Process pair types one after the other, in registry order
pub fn run_analysis_impl(
    tables: &mut [PairTypeHistograms],
    kernel: impl Send + Sync + Fn(&BucketLayout, &mut BucketStorage),
) {
    for table in tables {
        let (layout, storage) = table.split_mut();
        log::debug!("Processing {}", layout.pair_type());
        kernel(layout, storage);
    }
}
