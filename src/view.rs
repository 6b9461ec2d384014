use serde::Serialize;

use crate::aggregate::aggregate;
use crate::fetch::{fetch_history, PAGE_SIZE};
use crate::series::{metric_figure, Figure};
use crate::store::{Store, StoreError};
use crate::types::{AggregatedWindow, Granularity, Metric, DISPLAY_FORMAT};

// Flat table row, keyed with the store's column names.
#[derive(Debug, Clone, Serialize)]
pub struct WindowRow {
    #[serde(rename = "TimeStamp")]
    pub timestamp: String,
    #[serde(rename = "CreatedRecords")]
    pub created_records: i64,
    #[serde(rename = "ModifiedRecords")]
    pub modified_records: i64,
    #[serde(rename = "DeletedRecords")]
    pub deleted_records: i64,
    #[serde(rename = "AnomalyFlag")]
    pub anomaly_flag: bool,
}

impl From<&AggregatedWindow> for WindowRow {
    fn from(window: &AggregatedWindow) -> Self {
        Self {
            timestamp: window.window_start.format(DISPLAY_FORMAT).to_string(),
            created_records: window.created.count,
            modified_records: window.modified.count,
            deleted_records: window.deleted.count,
            anomaly_flag: window.alert,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub table_name: String,
    pub granularity: Granularity,
    pub rows: Vec<WindowRow>,
    pub created: Figure,
    pub modified: Figure,
    pub deleted: Figure,
}

/// Full render pipeline for one selection: fetch newest-first, sort
/// ascending, window, then build the table rows and three metric figures.
/// An entity with no data renders an empty view rather than failing.
pub async fn render(
    store: &Store,
    entity: &str,
    granularity: Granularity,
    max_records: Option<usize>,
) -> Result<DashboardView, StoreError> {
    let mut samples = fetch_history(store, entity, max_records, PAGE_SIZE).await?;
    samples.sort_by_key(|s| s.timestamp);
    let windows = aggregate(&samples, granularity);
    Ok(DashboardView {
        table_name: entity.to_string(),
        granularity,
        rows: windows.iter().map(WindowRow::from).collect(),
        created: metric_figure(entity, Metric::Created, &windows),
        modified: metric_figure(entity, Metric::Modified, &windows),
        deleted: metric_figure(entity, Metric::Deleted, &windows),
    })
}
