use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::types::{AggregatedWindow, Granularity, RecordSample};

/// Buckets samples into fixed-width windows keyed by the floored timestamp.
/// Counts and trend-band fields sum within a window, the alert flag ORs.
/// Only populated windows appear; output is ascending by window start.
pub fn aggregate(samples: &[RecordSample], granularity: Granularity) -> Vec<AggregatedWindow> {
    let mut windows: BTreeMap<NaiveDateTime, AggregatedWindow> = BTreeMap::new();
    for sample in samples {
        let key = granularity.floor(sample.timestamp);
        windows
            .entry(key)
            .or_insert_with(|| AggregatedWindow::new(key))
            .absorb(sample);
    }
    windows.into_values().collect()
}
