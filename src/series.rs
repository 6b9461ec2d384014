use serde::Serialize;

use crate::types::{AggregatedWindow, Metric, DISPLAY_FORMAT};

#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub name: String,
    pub mode: &'static str,
    pub x: Vec<String>,
    pub y: Vec<f64>,
}

impl Series {
    fn new(name: String) -> Self {
        Self {
            name,
            mode: "lines+markers",
            x: Vec::new(),
            y: Vec::new(),
        }
    }

    fn push(&mut self, x: &str, y: f64) {
        self.x.push(x.to_string());
        self.y.push(y);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub title: String,
    pub x_title: &'static str,
    pub y_title: &'static str,
    pub series: Vec<Series>,
}

/// Chart descriptor for one metric: the raw count line plus mean, upper
/// bound, and lower bound overlays. All four series are always present;
/// band series skip x positions where the window carried no value.
pub fn metric_figure(entity: &str, metric: Metric, windows: &[AggregatedWindow]) -> Figure {
    let stem = metric.label();
    let mut records = Series::new(format!("{stem} Records"));
    let mut mean = Series::new(format!("{stem} Mean"));
    let mut upper = Series::new(format!("{stem} Upper Bound"));
    let mut lower = Series::new(format!("{stem} Lower Bound"));

    for window in windows {
        let x = window.window_start.format(DISPLAY_FORMAT).to_string();
        let sample = window.metric(metric);
        records.push(&x, sample.count as f64);
        if let Some(v) = sample.band.mean {
            mean.push(&x, v);
        }
        if let Some(v) = sample.band.upper {
            upper.push(&x, v);
        }
        if let Some(v) = sample.band.lower {
            lower.push(&x, v);
        }
    }

    Figure {
        title: format!("{entity} {stem} Records Over Time"),
        x_title: "TimeStamp",
        y_title: "Records",
        series: vec![records, mean, upper, lower],
    }
}
