use tokio_postgres::Client;

use super::user::{row_to_user, User};

/// Adds the user to the room. Returns `false` if they were already a member.
pub async fn add_member(
  conn: &Client,
  room_pk: i64,
  user_id: i64,
) -> Result<bool, tokio_postgres::Error> {
  let query = "INSERT INTO room_members (room_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING";
  let inserted = conn.execute(query, &[&room_pk, &user_id]).await?;
  Ok(inserted > 0)
}

/// Removes the user from the room. Returns `false` if they were not a member.
pub async fn remove_member(
  conn: &Client,
  room_pk: i64,
  user_id: i64,
) -> Result<bool, tokio_postgres::Error> {
  let query = "DELETE FROM room_members WHERE room_id = $1 AND user_id = $2";
  let deleted = conn.execute(query, &[&room_pk, &user_id]).await?;
  Ok(deleted > 0)
}

pub async fn list_members(
  conn: &Client,
  room_pk: i64,
) -> Result<Vec<User>, tokio_postgres::Error> {
  let query = "SELECT u.id, u.username, u.email, u.created_at, u.updated_at \
               FROM users u JOIN room_members m ON m.user_id = u.id \
               WHERE m.room_id = $1 ORDER BY u.id";
  let rows = conn.query(query, &[&room_pk]).await?;
  Ok(rows.iter().map(row_to_user).collect())
}
