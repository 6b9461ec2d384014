use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::store::Store;
use crate::types::Granularity;
use crate::view;

/// Named control-input change as sent by the page:
/// `{"input": "table-dropdown", "value": "customer_orders"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "input", content = "value", rename_all = "kebab-case")]
pub enum InputChange {
    TableDropdown(Option<String>),
    GranularityToggle(Granularity),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub table: Option<String>,
    pub granularity: Granularity,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            table: None,
            granularity: Granularity::Hourly,
        }
    }
}

/// Owns the current selection and re-renders the outputs when inputs
/// change. A single task runs one cycle at a time: pending changes are
/// drained before each render, so the last change wins and no two render
/// cycles overlap.
pub struct Dispatcher {
    store: Arc<Store>,
    max_records: Option<usize>,
    selection: Selection,
    updates: broadcast::Sender<String>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<Store>,
        max_records: Option<usize>,
        updates: broadcast::Sender<String>,
    ) -> Self {
        Self {
            store,
            max_records,
            selection: Selection::default(),
            updates,
        }
    }

    pub fn apply(&mut self, change: InputChange) {
        match change {
            InputChange::TableDropdown(table) => self.selection.table = table,
            InputChange::GranularityToggle(granularity) => {
                self.selection.granularity = granularity
            }
        }
    }

    pub async fn run(mut self, mut inputs: mpsc::Receiver<InputChange>) {
        while let Some(change) = inputs.recv().await {
            self.apply(change);
            // Coalesce whatever queued up while the previous cycle ran.
            while let Ok(queued) = inputs.try_recv() {
                self.apply(queued);
            }
            self.render_cycle().await;
        }
    }

    async fn render_cycle(&self) {
        // No table selected: outputs stay as they are.
        let Some(table) = self.selection.table.clone() else {
            debug!("no table selected, skipping render");
            return;
        };
        let frame = match view::render(
            &self.store,
            &table,
            self.selection.granularity,
            self.max_records,
        )
        .await
        {
            Ok(view) => match serde_json::to_string(&view) {
                Ok(json) => json,
                Err(_) => return,
            },
            Err(e) => {
                warn!(table = %table, error = %e, "render failed");
                json!({ "error": e.to_string() }).to_string()
            }
        };
        // Send fails only when no client is subscribed
        let _ = self.updates.send(frame);
    }
}
