//! Room directory: single-table CRUD over `rooms`.
//!
//! Rooms are addressed by their public `room_id` token, never by the
//! internal primary key. The code snapshot is overwritten wholesale on
//! every update; the last writer wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::{Client, Row};

use crate::errors::is_unique_violation;
use crate::helpers::short_room_id;

/// Inserts attempted before a token collision is reported to the caller.
const CREATE_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
  pub id: i64,
  pub room_id: String,
  pub room_name: String,
  pub code_content: String,
  pub language: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

pub async fn create_new_room(
  conn: &Client,
  room_name: &str,
  language: &str,
) -> Result<Room, tokio_postgres::Error> {
  let query = "INSERT INTO rooms (room_id, room_name, language) VALUES ($1, $2, $3) \
               RETURNING id, room_id, room_name, code_content, language, created_at, updated_at";
  let mut attempt = 1;
  loop {
    let room_id = short_room_id();
    match conn.query_one(query, &[&room_id, &room_name, &language]).await {
      Ok(row) => return Ok(row_to_room(&row)),
      Err(err) if attempt < CREATE_ATTEMPTS && is_unique_violation(&err) => {
        tracing::warn!(%room_id, attempt, "room id collision, retrying");
        attempt += 1;
      }
      Err(err) => return Err(err),
    }
  }
}

pub async fn get_room_by_room_id(
  conn: &Client,
  room_id: &str,
) -> Result<Option<Room>, tokio_postgres::Error> {
  let query = "SELECT id, room_id, room_name, code_content, language, created_at, updated_at \
               FROM rooms WHERE room_id = $1";
  let row = conn.query_opt(query, &[&room_id]).await?;
  Ok(row.as_ref().map(row_to_room))
}

pub async fn list_rooms(conn: &Client) -> Result<Vec<Room>, tokio_postgres::Error> {
  let query = "SELECT id, room_id, room_name, code_content, language, created_at, updated_at \
               FROM rooms ORDER BY id";
  let rows = conn.query(query, &[]).await?;
  Ok(rows.iter().map(row_to_room).collect())
}

pub async fn update_room_code(
  conn: &Client,
  room_id: &str,
  code_content: &str,
) -> Result<Option<Room>, tokio_postgres::Error> {
  let query = "UPDATE rooms SET code_content = $2, updated_at = NOW() WHERE room_id = $1 \
               RETURNING id, room_id, room_name, code_content, language, created_at, updated_at";
  let row = conn.query_opt(query, &[&room_id, &code_content]).await?;
  Ok(row.as_ref().map(row_to_room))
}

/// Deletes the room together with its edit log and membership rows.
/// Returns `false` when no such room exists.
pub async fn delete_room(conn: &Client, room_id: &str) -> Result<bool, tokio_postgres::Error> {
  let query = "DELETE FROM rooms WHERE room_id = $1";
  let deleted = conn.execute(query, &[&room_id]).await?;
  Ok(deleted > 0)
}

fn row_to_room(row: &Row) -> Room {
  Room {
    id: row.get("id"),
    room_id: row.get("room_id"),
    room_name: row.get("room_name"),
    code_content: row.get("code_content"),
    language: row.get("language"),
    created_at: row.get("created_at"),
    updated_at: row.get("updated_at"),
  }
}
