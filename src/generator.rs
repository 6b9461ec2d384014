use std::collections::{HashMap, VecDeque};

use chrono::{Duration, NaiveDateTime, Timelike};
use rand::Rng;

use crate::types::{MetricSample, RecordSample, TrendBand};

// Demo source tables with per-minute base rates (created, modified, deleted).
pub const DEMO_TABLES: &[(&str, f64, f64, f64)] = &[
    ("billing_invoices", 14.0, 30.0, 2.0),
    ("customer_orders", 40.0, 90.0, 6.0),
    ("inventory_levels", 25.0, 160.0, 1.0),
    ("shipment_events", 55.0, 35.0, 3.0),
    ("user_accounts", 8.0, 22.0, 0.5),
];

const BAND_WINDOW: usize = 60;
const MIN_BAND_SAMPLES: usize = 30;
const BAND_SIGMA: f64 = 3.0;

struct MetricTrack {
    history: VecDeque<f64>,
}

impl MetricTrack {
    fn new() -> Self {
        Self {
            history: VecDeque::with_capacity(BAND_WINDOW),
        }
    }

    // Band over the trailing window, excluding the current sample.
    // Absent until enough history accumulates.
    fn band(&self) -> TrendBand {
        if self.history.len() < MIN_BAND_SAMPLES {
            return TrendBand::default();
        }
        let n = self.history.len() as f64;
        let mean = self.history.iter().sum::<f64>() / n;
        let var = self.history.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let sigma = var.sqrt();
        TrendBand {
            mean: Some(mean),
            upper: Some(mean + BAND_SIGMA * sigma),
            lower: Some((mean - BAND_SIGMA * sigma).max(0.0)),
        }
    }

    fn push(&mut self, value: f64) {
        if self.history.len() >= BAND_WINDOW {
            self.history.pop_front();
        }
        self.history.push_back(value);
    }
}

struct TableTracks {
    created: MetricTrack,
    modified: MetricTrack,
    deleted: MetricTrack,
}

pub struct SummaryGenerator {
    pub anomaly_rate: f64,
    tracks: HashMap<String, TableTracks>,
}

impl SummaryGenerator {
    pub fn new(anomaly_rate: f64) -> Self {
        let mut tracks = HashMap::new();
        for (name, ..) in DEMO_TABLES {
            tracks.insert(
                name.to_string(),
                TableTracks {
                    created: MetricTrack::new(),
                    modified: MetricTrack::new(),
                    deleted: MetricTrack::new(),
                },
            );
        }
        Self {
            anomaly_rate,
            tracks,
        }
    }

    /// One summary row per demo table per minute, covering the `minutes`
    /// before `end`, oldest first.
    pub fn generate_history(&mut self, end: NaiveDateTime, minutes: usize) -> Vec<RecordSample> {
        let mut out = Vec::with_capacity(minutes * DEMO_TABLES.len());
        for step in (1..=minutes).rev() {
            let ts = end - Duration::minutes(step as i64);
            for &(name, created_rate, modified_rate, deleted_rate) in DEMO_TABLES {
                out.push(self.sample_row(name, ts, created_rate, modified_rate, deleted_rate));
            }
        }
        out
    }

    fn sample_row(
        &mut self,
        name: &str,
        ts: NaiveDateTime,
        created_rate: f64,
        modified_rate: f64,
        deleted_rate: f64,
    ) -> RecordSample {
        let mut rng = rand::thread_rng();
        let spike = rng.gen_bool(self.anomaly_rate.clamp(0.0, 1.0));
        let tracks = self.tracks.get_mut(name).unwrap();

        let (created, created_hit) =
            sample_metric(&mut tracks.created, created_rate, ts, spike, &mut rng);
        let (modified, modified_hit) =
            sample_metric(&mut tracks.modified, modified_rate, ts, spike, &mut rng);
        let (deleted, deleted_hit) =
            sample_metric(&mut tracks.deleted, deleted_rate, ts, spike, &mut rng);

        RecordSample {
            table_name: name.to_string(),
            timestamp: ts,
            created,
            modified,
            deleted,
            alert: created_hit || modified_hit || deleted_hit,
        }
    }
}

fn sample_metric(
    track: &mut MetricTrack,
    rate: f64,
    ts: NaiveDateTime,
    spike: bool,
    rng: &mut impl Rng,
) -> (MetricSample, bool) {
    let hour = ts.hour() as f64 + ts.minute() as f64 / 60.0;
    // Diurnal load curve: peak mid-afternoon, trough around 02:00
    let daily = 1.0 + 0.6 * ((hour - 14.0) * std::f64::consts::PI / 12.0).cos();
    let mut value = rate * daily * rng.gen_range(0.7..1.3);
    if spike {
        // 5-15x burst, the kind a backfill or bad deploy produces
        value *= rng.gen_range(5.0..15.0);
    }
    let count = value.round().max(0.0) as i64;

    let band = track.band();
    let breached = match (band.lower, band.upper) {
        (Some(lower), Some(upper)) => (count as f64) < lower || (count as f64) > upper,
        _ => false,
    };
    track.push(count as f64);
    (MetricSample { count, band }, breached)
}
