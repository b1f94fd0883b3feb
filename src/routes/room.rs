use super::models::{CreateRoomRequest, UpdateCodeRequest};

use crate::db::member;
use crate::db::room::{
  create_new_room, delete_room as delete_room_row, get_room_by_room_id, list_rooms as list_room_rows,
  update_room_code, Room,
};
use crate::db::user::{get_user_by_id, User};
use crate::errors::{db_error_to_service_error, internal_error_to_service_error, ServiceError};
use crate::ConnectionPool;
use axum::{extract::Path, extract::State, Json};
use serde_json::{json, Value};
use tokio_postgres::Client;

pub async fn create_room(
  State(pool): State<ConnectionPool>,
  Json(request): Json<CreateRoomRequest>,
) -> Result<Json<Room>, ServiceError> {
  let conn = pool.get().await.map_err(internal_error_to_service_error)?;
  let room = create_new_room(&conn, &request.room_name, &request.language)
    .await
    .map_err(db_error_to_service_error)?;
  tracing::info!(room_id = %room.room_id, language = %room.language, "room created");
  Ok(Json(room))
}

pub async fn get_room(
  State(pool): State<ConnectionPool>,
  Path(room_id): Path<String>,
) -> Result<Json<Room>, ServiceError> {
  let conn = pool.get().await.map_err(internal_error_to_service_error)?;
  let room = find_room(&conn, &room_id).await?;
  Ok(Json(room))
}

pub async fn list_rooms(State(pool): State<ConnectionPool>) -> Result<Json<Vec<Room>>, ServiceError> {
  let conn = pool.get().await.map_err(internal_error_to_service_error)?;
  let rooms = list_room_rows(&conn)
    .await
    .map_err(db_error_to_service_error)?;
  Ok(Json(rooms))
}

pub async fn update_code(
  State(pool): State<ConnectionPool>,
  Path(room_id): Path<String>,
  Json(request): Json<UpdateCodeRequest>,
) -> Result<Json<Room>, ServiceError> {
  let conn = pool.get().await.map_err(internal_error_to_service_error)?;
  let room = update_room_code(&conn, &room_id, &request.code)
    .await
    .map_err(db_error_to_service_error)?
    .ok_or_else(|| ServiceError::not_found("Room"))?;
  tracing::debug!(room_id = %room.room_id, bytes = room.code_content.len(), "code updated");
  Ok(Json(room))
}

pub async fn list_members(
  State(pool): State<ConnectionPool>,
  Path(room_id): Path<String>,
) -> Result<Json<Vec<User>>, ServiceError> {
  let conn = pool.get().await.map_err(internal_error_to_service_error)?;
  let room = find_room(&conn, &room_id).await?;
  let members = member::list_members(&conn, room.id)
    .await
    .map_err(db_error_to_service_error)?;
  Ok(Json(members))
}

pub async fn add_member(
  State(pool): State<ConnectionPool>,
  Path((room_id, user_id)): Path<(String, i64)>,
) -> Result<Json<Value>, ServiceError> {
  let conn = pool.get().await.map_err(internal_error_to_service_error)?;
  let room = find_room(&conn, &room_id).await?;
  // An unknown user leaves the membership untouched; the reply is the same.
  match get_user_by_id(&conn, user_id)
    .await
    .map_err(db_error_to_service_error)?
  {
    Some(user) => {
      let added = member::add_member(&conn, room.id, user.id)
        .await
        .map_err(db_error_to_service_error)?;
      tracing::debug!(room_id = %room.room_id, user_id, added, "add member");
    }
    None => tracing::debug!(room_id = %room.room_id, user_id, "add member: no such user"),
  }
  Ok(Json(json!({ "message": "Member added successfully" })))
}

pub async fn remove_member(
  State(pool): State<ConnectionPool>,
  Path((room_id, user_id)): Path<(String, i64)>,
) -> Result<Json<Value>, ServiceError> {
  let conn = pool.get().await.map_err(internal_error_to_service_error)?;
  let room = find_room(&conn, &room_id).await?;
  match get_user_by_id(&conn, user_id)
    .await
    .map_err(db_error_to_service_error)?
  {
    Some(user) => {
      let removed = member::remove_member(&conn, room.id, user.id)
        .await
        .map_err(db_error_to_service_error)?;
      tracing::debug!(room_id = %room.room_id, user_id, removed, "remove member");
    }
    None => tracing::debug!(room_id = %room.room_id, user_id, "remove member: no such user"),
  }
  Ok(Json(json!({ "message": "Member removed successfully" })))
}

pub async fn delete_room(
  State(pool): State<ConnectionPool>,
  Path(room_id): Path<String>,
) -> Result<Json<Value>, ServiceError> {
  let conn = pool.get().await.map_err(internal_error_to_service_error)?;
  let deleted = delete_room_row(&conn, &room_id)
    .await
    .map_err(db_error_to_service_error)?;
  if !deleted {
    return Err(ServiceError::not_found("Room"));
  }
  tracing::info!(%room_id, "room deleted");
  Ok(Json(json!({ "message": "Room deleted successfully" })))
}

async fn find_room(conn: &Client, room_id: &str) -> Result<Room, ServiceError> {
  get_room_by_room_id(conn, room_id)
    .await
    .map_err(db_error_to_service_error)?
    .ok_or_else(|| ServiceError::not_found("Room"))
}
