use chrono::{NaiveDateTime, Timelike};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

// Range-key wire format in the summary table, e.g. "202608220930".
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M";
// Human-readable form used in table rows and chart x values.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ── Summary records (read from the store) ──

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendBand {
    pub mean: Option<f64>,
    pub upper: Option<f64>,
    pub lower: Option<f64>,
}

impl TrendBand {
    // Present components add; a component stays None only while no
    // contributing sample carried it.
    pub fn accumulate(&mut self, other: &TrendBand) {
        self.mean = sum_opt(self.mean, other.mean);
        self.upper = sum_opt(self.upper, other.upper);
        self.lower = sum_opt(self.lower, other.lower);
    }
}

fn sum_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x + y),
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSample {
    pub count: i64,
    pub band: TrendBand,
}

impl MetricSample {
    pub fn accumulate(&mut self, other: &MetricSample) {
        self.count += other.count;
        self.band.accumulate(&other.band);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordSample {
    pub table_name: String,
    pub timestamp: NaiveDateTime,
    pub created: MetricSample,
    pub modified: MetricSample,
    pub deleted: MetricSample,
    pub alert: bool,
}

impl RecordSample {
    pub fn metric(&self, metric: Metric) -> &MetricSample {
        match metric {
            Metric::Created => &self.created,
            Metric::Modified => &self.modified,
            Metric::Deleted => &self.deleted,
        }
    }
}

// ── Derived windows (recomputed per render, never persisted) ──

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedWindow {
    pub window_start: NaiveDateTime,
    pub created: MetricSample,
    pub modified: MetricSample,
    pub deleted: MetricSample,
    pub alert: bool,
}

impl AggregatedWindow {
    pub fn new(window_start: NaiveDateTime) -> Self {
        Self {
            window_start,
            created: MetricSample::default(),
            modified: MetricSample::default(),
            deleted: MetricSample::default(),
            alert: false,
        }
    }

    pub fn absorb(&mut self, sample: &RecordSample) {
        self.created.accumulate(&sample.created);
        self.modified.accumulate(&sample.modified);
        self.deleted.accumulate(&sample.deleted);
        self.alert |= sample.alert;
    }

    pub fn metric(&self, metric: Metric) -> &MetricSample {
        match metric {
            Metric::Created => &self.created,
            Metric::Modified => &self.modified,
            Metric::Deleted => &self.deleted,
        }
    }
}

// A raw sample viewed as a single-sample window, for unaggregated display.
impl From<&RecordSample> for AggregatedWindow {
    fn from(sample: &RecordSample) -> Self {
        Self {
            window_start: sample.timestamp,
            created: sample.created.clone(),
            modified: sample.modified.clone(),
            deleted: sample.deleted.clone(),
            alert: sample.alert,
        }
    }
}

// ── Selection enums ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Created,
    Modified,
    Deleted,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Created, Metric::Modified, Metric::Deleted];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Created => "Created",
            Metric::Modified => "Modified",
            Metric::Deleted => "Deleted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum Granularity {
    #[value(name = "hourly", alias = "1h")]
    #[serde(rename = "hourly")]
    Hourly,
    #[value(name = "3-hourly", alias = "3h")]
    #[serde(rename = "3-hourly")]
    ThreeHourly,
}

impl Granularity {
    pub fn width_hours(&self) -> u32 {
        match self {
            Granularity::Hourly => 1,
            Granularity::ThreeHourly => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Granularity::Hourly => "hourly",
            Granularity::ThreeHourly => "3-hourly",
        }
    }

    // Window key: hour floored to the window width, minutes dropped.
    pub fn floor(&self, ts: NaiveDateTime) -> NaiveDateTime {
        let width = self.width_hours();
        let hour = ts.hour() - ts.hour() % width;
        // hour < 24 by construction
        ts.date().and_hms_opt(hour, 0, 0).unwrap()
    }
}
