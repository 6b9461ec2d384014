use std::collections::{BTreeMap, BTreeSet, HashMap};

use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use chrono::NaiveDateTime;
use thiserror::Error;

use crate::types::*;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("query failed: {0}")]
    Query(String),
    #[error("scan failed: {0}")]
    Scan(String),
    #[error("malformed item: {0}")]
    Malformed(String),
}

// ── Summary-table attribute names ──

pub const ATTR_TABLE_NAME: &str = "TableName";
pub const ATTR_TIMESTAMP: &str = "TimeStamp";
pub const ATTR_ANOMALY_FLAG: &str = "AnomalyFlag";

// Per-metric attributes derive from the metric label: CreatedRecords,
// CreatedMean, CreatedUpperBound, CreatedLowerBound, and so on.

// ── Store handle ──

type Item = HashMap<String, AttributeValue>;

#[derive(Debug, Clone)]
pub enum Cursor {
    Dynamo(Item),
    Offset(usize),
}

#[derive(Debug)]
pub struct StorePage {
    pub samples: Vec<RecordSample>,
    pub next: Option<Cursor>,
}

/// One summary store, either the real DynamoDB table or the in-memory
/// demo backend. Built once at startup and shared behind an `Arc`.
#[derive(Debug)]
pub enum Store {
    Dynamo(DynamoStore),
    Memory(MemoryStore),
}

impl Store {
    /// One descending page of samples for an entity, newest first.
    /// A cursor minted by the other backend restarts from the top.
    pub async fn query_page(
        &self,
        entity: &str,
        limit: usize,
        cursor: Option<Cursor>,
    ) -> Result<StorePage, StoreError> {
        match self {
            Store::Dynamo(store) => store.query_page(entity, limit, cursor).await,
            Store::Memory(store) => store.query_page(entity, limit, cursor),
        }
    }

    /// Distinct entity names present in the store, sorted.
    pub async fn list_entities(&self) -> Result<Vec<String>, StoreError> {
        match self {
            Store::Dynamo(store) => store.list_entities().await,
            Store::Memory(store) => store.list_entities(),
        }
    }
}

// ── DynamoDB backend ──

#[derive(Debug)]
pub struct DynamoStore {
    client: Client,
    table: String,
}

impl DynamoStore {
    pub async fn connect(table: &str, region: &str) -> Self {
        let region = RegionProviderChain::first_try(Region::new(region.to_string()))
            .or_default_provider();
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await;
        Self {
            client: Client::new(&config),
            table: table.to_string(),
        }
    }

    async fn query_page(
        &self,
        entity: &str,
        limit: usize,
        cursor: Option<Cursor>,
    ) -> Result<StorePage, StoreError> {
        let start_key = match cursor {
            Some(Cursor::Dynamo(key)) => Some(key),
            _ => None,
        };
        let mut req = self
            .client
            .query()
            .table_name(&self.table)
            .key_condition_expression("#tn = :tn")
            .expression_attribute_names("#tn", ATTR_TABLE_NAME)
            .expression_attribute_values(":tn", AttributeValue::S(entity.to_string()))
            .scan_index_forward(false)
            .limit(limit.clamp(1, i32::MAX as usize) as i32);
        if let Some(key) = start_key {
            req = req.set_exclusive_start_key(Some(key));
        }
        let resp = req
            .send()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let mut samples = Vec::with_capacity(resp.items().len());
        for item in resp.items() {
            samples.push(decode_item(item)?);
        }
        let next = resp.last_evaluated_key().map(|key| Cursor::Dynamo(key.clone()));
        Ok(StorePage { samples, next })
    }

    // Full paginated scan, projected down to the partition key.
    async fn list_entities(&self) -> Result<Vec<String>, StoreError> {
        let mut names = BTreeSet::new();
        let mut start_key: Option<Item> = None;
        loop {
            let mut req = self
                .client
                .scan()
                .table_name(&self.table)
                .projection_expression("#tn")
                .expression_attribute_names("#tn", ATTR_TABLE_NAME);
            if let Some(key) = start_key {
                req = req.set_exclusive_start_key(Some(key));
            }
            let resp = req
                .send()
                .await
                .map_err(|e| StoreError::Scan(e.to_string()))?;
            for item in resp.items() {
                names.insert(attr_s(item, ATTR_TABLE_NAME)?);
            }
            match resp.last_evaluated_key() {
                Some(key) => start_key = Some(key.clone()),
                None => break,
            }
        }
        Ok(names.into_iter().collect())
    }
}

// ── Item decoding ──

pub fn decode_item(item: &Item) -> Result<RecordSample, StoreError> {
    let table_name = attr_s(item, ATTR_TABLE_NAME)?;
    let raw_ts = attr_s(item, ATTR_TIMESTAMP)?;
    let timestamp = NaiveDateTime::parse_from_str(&raw_ts, TIMESTAMP_FORMAT)
        .map_err(|_| StoreError::Malformed(format!("bad {ATTR_TIMESTAMP} value: {raw_ts}")))?;
    Ok(RecordSample {
        table_name,
        timestamp,
        created: decode_metric(item, Metric::Created)?,
        modified: decode_metric(item, Metric::Modified)?,
        deleted: decode_metric(item, Metric::Deleted)?,
        alert: attr_bool(item, ATTR_ANOMALY_FLAG),
    })
}

// Counts are required; trend-band attributes decode to None when absent.
fn decode_metric(item: &Item, metric: Metric) -> Result<MetricSample, StoreError> {
    let stem = metric.label();
    Ok(MetricSample {
        count: attr_i64(item, &format!("{stem}Records"))?,
        band: TrendBand {
            mean: attr_f64_opt(item, &format!("{stem}Mean"))?,
            upper: attr_f64_opt(item, &format!("{stem}UpperBound"))?,
            lower: attr_f64_opt(item, &format!("{stem}LowerBound"))?,
        },
    })
}

fn attr_s(item: &Item, name: &str) -> Result<String, StoreError> {
    match item.get(name) {
        Some(AttributeValue::S(value)) => Ok(value.clone()),
        Some(_) => Err(StoreError::Malformed(format!("{name} is not a string"))),
        None => Err(StoreError::Malformed(format!("{name} is missing"))),
    }
}

fn attr_i64(item: &Item, name: &str) -> Result<i64, StoreError> {
    match item.get(name) {
        Some(AttributeValue::N(raw)) => raw
            .parse::<i64>()
            .map_err(|_| StoreError::Malformed(format!("{name} is not an integer: {raw}"))),
        Some(_) => Err(StoreError::Malformed(format!("{name} is not a number"))),
        None => Err(StoreError::Malformed(format!("{name} is missing"))),
    }
}

fn attr_f64_opt(item: &Item, name: &str) -> Result<Option<f64>, StoreError> {
    match item.get(name) {
        None | Some(AttributeValue::Null(_)) => Ok(None),
        Some(AttributeValue::N(raw)) => raw
            .parse::<f64>()
            .map(Some)
            .map_err(|_| StoreError::Malformed(format!("{name} is not numeric: {raw}"))),
        Some(_) => Err(StoreError::Malformed(format!("{name} is not a number"))),
    }
}

fn attr_bool(item: &Item, name: &str) -> bool {
    matches!(item.get(name), Some(AttributeValue::Bool(true)))
}

// ── In-memory backend (demo mode and tests) ──

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: BTreeMap<String, Vec<RecordSample>>,
    unavailable: BTreeSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_samples(samples: Vec<RecordSample>) -> Self {
        let mut store = Self::default();
        for sample in samples {
            store.insert(sample);
        }
        store
    }

    // Rows stay sorted ascending per table; pages are served from the tail.
    pub fn insert(&mut self, sample: RecordSample) {
        let rows = self.tables.entry(sample.table_name.clone()).or_default();
        let at = rows.partition_point(|r| r.timestamp <= sample.timestamp);
        rows.insert(at, sample);
    }

    // Queries for a marked entity fail with StoreError::Query.
    pub fn mark_unavailable(&mut self, entity: &str) {
        self.unavailable.insert(entity.to_string());
    }

    fn query_page(
        &self,
        entity: &str,
        limit: usize,
        cursor: Option<Cursor>,
    ) -> Result<StorePage, StoreError> {
        if self.unavailable.contains(entity) {
            return Err(StoreError::Query(format!("{entity} is unavailable")));
        }
        let rows = match self.tables.get(entity) {
            Some(rows) => rows,
            None => {
                return Ok(StorePage {
                    samples: Vec::new(),
                    next: None,
                })
            }
        };
        let offset = match cursor {
            Some(Cursor::Offset(n)) => n,
            _ => 0,
        };
        // The offset counts rows already consumed from the newest end.
        let remaining = rows.len().saturating_sub(offset);
        let take = remaining.min(limit.max(1));
        let samples: Vec<RecordSample> = rows[remaining - take..remaining]
            .iter()
            .rev()
            .cloned()
            .collect();
        let consumed = offset + take;
        let next = (consumed < rows.len()).then_some(Cursor::Offset(consumed));
        Ok(StorePage { samples, next })
    }

    fn list_entities(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.tables.keys().cloned().collect())
    }
}
