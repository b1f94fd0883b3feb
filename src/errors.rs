use axum::{http::StatusCode, response::IntoResponse, Json};
use derive_more::{Display, From};
use serde::Serialize;
use tokio_postgres::error::SqlState;

use crate::config::ConfigError;

#[derive(Debug)]
pub struct ServiceError {
  code: StatusCode,
  message: String,
}

impl ServiceError {
  pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
    Self {
      code,
      message: message.into(),
    }
  }

  pub fn not_found(what: &str) -> Self {
    Self::new(StatusCode::NOT_FOUND, format!("{} not found", what))
  }

  pub fn code(&self) -> StatusCode {
    self.code
  }

  pub fn message(&self) -> &str {
    &self.message
  }
}

impl IntoResponse for ServiceError {
  fn into_response(self) -> axum::response::Response {
    if self.code.is_server_error() {
      tracing::error!(status = %self.code, message = %self.message, "request failed");
    }
    (
      self.code,
      Json(ResponseMessage {
        detail: self.message,
      }),
    )
      .into_response()
  }
}

#[derive(Serialize)]
struct ResponseMessage {
  detail: String,
}

pub fn internal_error_to_service_error<E>(err: E) -> ServiceError
where
  E: std::error::Error,
{
  ServiceError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

pub fn db_error_to_service_error(err: tokio_postgres::Error) -> ServiceError {
  match err.code() {
    Some(state) if *state == SqlState::FOREIGN_KEY_VIOLATION => {
      ServiceError::new(StatusCode::BAD_REQUEST, "foreign key violation")
    }
    Some(state) if *state == SqlState::UNIQUE_VIOLATION => {
      ServiceError::new(StatusCode::CONFLICT, "unique key violation")
    }
    Some(state) => ServiceError::new(
      StatusCode::INTERNAL_SERVER_ERROR,
      "Database error: ".to_owned() + state.code(),
    ),
    None => ServiceError::new(
      StatusCode::INTERNAL_SERVER_ERROR,
      "Database error: ".to_owned() + &err.to_string(),
    ),
  }
}

pub fn is_unique_violation(err: &tokio_postgres::Error) -> bool {
  err.code() == Some(&SqlState::UNIQUE_VIOLATION)
}

/// Failures that stop the server before it starts serving.
#[derive(Debug, Display, From)]
pub enum StartupError {
  #[display(fmt = "configuration error: {}", _0)]
  Config(ConfigError),
  #[display(fmt = "database error: {}", _0)]
  Database(tokio_postgres::Error),
  #[display(fmt = "server error: {}", _0)]
  Server(hyper::Error),
}

impl std::error::Error for StartupError {}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn not_found_renders_detail_body() {
    let response = ServiceError::not_found("Room").into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, serde_json::json!({ "detail": "Room not found" }));
  }

  #[test]
  fn internal_errors_map_to_500() {
    let io = std::io::Error::new(std::io::ErrorKind::Other, "pool timed out");
    let err = internal_error_to_service_error(io);
    assert_eq!(err.code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.message(), "pool timed out");
  }

  #[test]
  fn startup_error_wraps_config_error() {
    let err: StartupError = ConfigError::Missing("POSTGRES_HOST".to_owned()).into();
    assert_eq!(
      err.to_string(),
      "configuration error: missing environment variable POSTGRES_HOST"
    );
  }
}
