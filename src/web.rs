use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::{broadcast, mpsc};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::events::{Dispatcher, InputChange};
use crate::store::{Store, StoreError};
use crate::types::Granularity;
use crate::view::{self, DashboardView};

struct AppState {
    store: Arc<Store>,
    max_records: Option<usize>,
    inputs: mpsc::Sender<InputChange>,
    updates: broadcast::Sender<String>,
}

/// Builds the HTTP surface and spawns the dispatcher behind it.
pub fn router(store: Arc<Store>, max_records: Option<usize>) -> Router {
    let (inputs, input_rx) = mpsc::channel::<InputChange>(64);
    let (updates, _) = broadcast::channel::<String>(256);

    // Spawn the dispatcher that owns the selection state
    let dispatcher = Dispatcher::new(store.clone(), max_records, updates.clone());
    tokio::spawn(dispatcher.run(input_rx));

    let state = Arc::new(AppState {
        store,
        max_records,
        inputs,
        updates,
    });

    Router::new()
        .route("/health", get(health))
        .route("/api/tables", get(list_tables))
        .route("/api/view", get(get_view))
        .route("/ws", get(ws_handler))
        .fallback_service(ServeDir::new("static"))
        .with_state(state)
}

pub async fn run(port: u16, store: Arc<Store>, max_records: Option<usize>) -> anyhow::Result<()> {
    let app = router(store, max_records);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("dashboard at http://localhost:{port}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn list_tables(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    let names = state.store.list_entities().await.map_err(store_error)?;
    Ok(Json(names))
}

#[derive(Deserialize)]
struct ViewParams {
    table: String,
    granularity: Option<Granularity>,
}

async fn get_view(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ViewParams>,
) -> Result<Json<DashboardView>, (StatusCode, String)> {
    let granularity = params.granularity.unwrap_or(Granularity::Hourly);
    let view = view::render(&state.store, &params.table, granularity, state.max_records)
        .await
        .map_err(store_error)?;
    Ok(Json(view))
}

fn store_error(e: StoreError) -> (StatusCode, String) {
    (StatusCode::BAD_GATEWAY, e.to_string())
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let rx = state.updates.subscribe();
    let inputs = state.inputs.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, rx, inputs))
}

// Bridges one socket both ways: rendered view frames out, input changes in.
async fn handle_socket(
    socket: WebSocket,
    mut rx: broadcast::Receiver<String>,
    inputs: mpsc::Sender<InputChange>,
) {
    let (mut sender, mut receiver) = socket.split();
    loop {
        tokio::select! {
            update = rx.recv() => match update {
                Ok(msg) => {
                    if sender.send(Message::Text(msg.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "websocket client lagging, frames dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<InputChange>(&text) {
                        Ok(change) => {
                            if inputs.send(change).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!(error = %e, "unrecognized input frame"),
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(_)) => break,
            },
        }
    }
}
