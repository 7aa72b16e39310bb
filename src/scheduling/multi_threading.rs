//! Multi-threaded back-end of the analysis

use crate::histograms::{BucketLayout, BucketStorage, PairTypeHistograms};

/// Process pair types in parallel, one task per pair type
///
/// Each task has exclusive access to its pair type's storage, so no
/// synchronization is needed beyond the final join.
///
pub fn run_analysis_impl(
    tables: &mut [PairTypeHistograms],
    kernel: impl Send + Sync + Fn(&BucketLayout, &mut BucketStorage),
) {
    // This function is a synchronization scope: it will only return
    // once all inner tasks have been executed
    rayon::scope(|scope| {
        let kernel_ref = &kernel;
        for table in tables {
            scope.spawn(move |_| {
                let (layout, storage) = table.split_mut();
                log::debug!("Processing {}", layout.pair_type());
                kernel_ref(layout, storage);
            });
        }
    });
}
