#![allow(dead_code)]

use std::sync::{Mutex, PoisonError};

use axum::{body::Body, http::Request, http::StatusCode, Router};
use bb8::Pool;
use bb8_postgres::PostgresConnectionManager;
use code_rooms::config::Settings;
use code_rooms::db::setup_conn_pool;
use code_rooms::routes::AppState;
use serde_json::Value;
use tokio_postgres::NoTls;
use tower::ServiceExt;

// Tests run in parallel; the migration scripts must not.
static MIGRATIONS: Mutex<()> = Mutex::new(());

/// State whose pool never connects. Only for routes that stay off the database.
pub fn offline_state() -> AppState {
  let settings = Settings::from_lookup(|key| match key {
    "POSTGRES_USER" => Some("postgres".to_owned()),
    "POSTGRES_PASSWORD" => Some("postgres".to_owned()),
    "POSTGRES_HOST" => Some("127.0.0.1".to_owned()),
    "POSTGRES_PORT" => Some("5432".to_owned()),
    "POSTGRES_DB" => Some("code_rooms_test".to_owned()),
    _ => None,
  })
  .unwrap();
  let manager = PostgresConnectionManager::new(settings.database.pg_config(), NoTls);
  let pool = Pool::builder().build_unchecked(manager);
  AppState::new(pool, settings)
}

/// State backed by a live PostgreSQL, or `None` when `POSTGRES_HOST` is unset.
#[allow(clippy::await_holding_lock)]
pub async fn database_state() -> Option<AppState> {
  dotenv::dotenv().ok();
  if std::env::var("POSTGRES_HOST").is_err() {
    return None;
  }
  let settings = Settings::from_env().expect("settings");
  let _guard = MIGRATIONS.lock().unwrap_or_else(PoisonError::into_inner);
  let pool = setup_conn_pool(&settings.database)
    .await
    .expect("connect test database");
  Some(AppState::new(pool, settings))
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
  let response = app.oneshot(request).await.unwrap();
  let status = response.status();
  let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
  (status, serde_json::from_slice(&body).unwrap())
}
