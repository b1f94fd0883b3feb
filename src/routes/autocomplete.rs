use super::models::SuggestionRequest;
use crate::autocomplete::{line_context, suggestions, Suggestion};
use crate::db::room::get_room_by_room_id;
use crate::errors::{db_error_to_service_error, internal_error_to_service_error, ServiceError};
use crate::ConnectionPool;
use axum::{extract::Path, extract::State, Json};
use serde_json::{json, Value};

pub async fn get_suggestions(Json(request): Json<SuggestionRequest>) -> Json<Vec<Suggestion>> {
  let found = suggestions(&request.language, &request.prefix);
  tracing::debug!(
    language = %request.language,
    prefix = %request.prefix,
    room_id = ?request.room_id,
    count = found.len(),
    "autocomplete lookup"
  );
  Json(found)
}

/// A missing room and an out-of-range line both answer with `""`.
pub async fn get_code_context(
  State(pool): State<ConnectionPool>,
  Path((room_id, line_number)): Path<(String, i64)>,
) -> Result<Json<Value>, ServiceError> {
  let conn = pool.get().await.map_err(internal_error_to_service_error)?;
  let room = get_room_by_room_id(&conn, &room_id)
    .await
    .map_err(db_error_to_service_error)?;
  let context = room
    .as_ref()
    .map(|room| line_context(&room.code_content, line_number))
    .unwrap_or("");
  Ok(Json(json!({ "context": context })))
}
