use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::{Client, Row};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id: i64,
  pub username: String,
  pub email: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

pub async fn insert_new_user(
  conn: &Client,
  username: &str,
  email: &str,
) -> Result<User, tokio_postgres::Error> {
  let query = "INSERT INTO users (username, email) VALUES ($1, $2) \
               RETURNING id, username, email, created_at, updated_at";
  let row = conn.query_one(query, &[&username, &email]).await?;
  Ok(row_to_user(&row))
}

pub async fn get_user_by_id(
  conn: &Client,
  id: i64,
) -> Result<Option<User>, tokio_postgres::Error> {
  let query = "SELECT id, username, email, created_at, updated_at FROM users WHERE id = $1";
  let row = conn.query_opt(query, &[&id]).await?;
  Ok(row.as_ref().map(row_to_user))
}

pub(crate) fn row_to_user(row: &Row) -> User {
  User {
    id: row.get("id"),
    username: row.get("username"),
    email: row.get("email"),
    created_at: row.get("created_at"),
    updated_at: row.get("updated_at"),
  }
}
