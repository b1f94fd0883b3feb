use crate::ws::{run_editor_session, ConnectionRegistry};
use axum::response::IntoResponse;
use axum::{extract::Path, extract::State, extract::WebSocketUpgrade, Json};
use serde_json::{json, Value};

/// Realtime channel for a room. The room token is not checked against the
/// database; any token names a channel.
pub async fn editor_socket(
  ws: WebSocketUpgrade,
  State(registry): State<ConnectionRegistry>,
  Path(room_id): Path<String>,
) -> impl IntoResponse {
  ws.on_upgrade(move |socket| run_editor_session(socket, registry, room_id))
}

pub async fn room_connections(
  State(registry): State<ConnectionRegistry>,
  Path(room_id): Path<String>,
) -> Json<Value> {
  let active_connections = registry.connection_count(&room_id);
  Json(json!({
    "room_id": room_id,
    "active_connections": active_connections,
  }))
}
