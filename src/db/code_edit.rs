//! Append-only edit log. Rows are written here and removed only by the
//! cascade when their room is deleted; nothing on the HTTP surface reads
//! them back.

use serde::{Deserialize, Serialize};
use tokio_postgres::Client;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditOperation {
  Insert,
  Delete,
  Replace,
}

impl EditOperation {
  pub fn as_str(&self) -> &'static str {
    match self {
      EditOperation::Insert => "insert",
      EditOperation::Delete => "delete",
      EditOperation::Replace => "replace",
    }
  }
}

#[derive(Debug, Clone)]
pub struct NewCodeEdit<'a> {
  pub room_pk: i64,
  pub user_id: i64,
  pub content: &'a str,
  pub operation: EditOperation,
  pub line_number: Option<i32>,
  pub column_number: Option<i32>,
}

/// Appends an entry and returns its id.
pub async fn append_code_edit(
  conn: &Client,
  edit: &NewCodeEdit<'_>,
) -> Result<i64, tokio_postgres::Error> {
  let query = "INSERT INTO code_edits \
               (room_id, user_id, content, operation, line_number, column_number) \
               VALUES ($1, $2, $3, $4, $5, $6) RETURNING id";
  let row = conn
    .query_one(
      query,
      &[
        &edit.room_pk,
        &edit.user_id,
        &edit.content,
        &edit.operation.as_str(),
        &edit.line_number,
        &edit.column_number,
      ],
    )
    .await?;
  Ok(row.get(0))
}
