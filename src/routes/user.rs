use super::models::NewUserRequest;
use crate::db::user::{get_user_by_id, insert_new_user, User};
use crate::errors::{db_error_to_service_error, internal_error_to_service_error, ServiceError};
use crate::ConnectionPool;
use axum::{extract::Path, extract::State, Json};

pub async fn create_user(
  State(pool): State<ConnectionPool>,
  Json(user): Json<NewUserRequest>,
) -> Result<Json<User>, ServiceError> {
  let conn = pool.get().await.map_err(internal_error_to_service_error)?;
  let user = insert_new_user(&conn, &user.username, &user.email)
    .await
    .map_err(db_error_to_service_error)?;
  tracing::info!(user_id = user.id, "user created");
  Ok(Json(user))
}

pub async fn get_user(
  State(pool): State<ConnectionPool>,
  Path(user_id): Path<i64>,
) -> Result<Json<User>, ServiceError> {
  let conn = pool.get().await.map_err(internal_error_to_service_error)?;
  let user = get_user_by_id(&conn, user_id)
    .await
    .map_err(db_error_to_service_error)?
    .ok_or_else(|| ServiceError::not_found("User"))?;
  Ok(Json(user))
}
