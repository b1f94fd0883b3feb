pub mod autocomplete;
pub mod editor;
pub mod models;
pub mod room;
pub mod user;

use std::sync::Arc;

use axum::{
  extract::{FromRef, State},
  http::HeaderValue,
  routing::{get, post, put},
  Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
  cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
  trace::TraceLayer,
};

use crate::config::Settings;
use crate::ws::ConnectionRegistry;
use crate::ConnectionPool;

#[derive(Clone, FromRef)]
pub struct AppState {
  pub pool: ConnectionPool,
  pub registry: ConnectionRegistry,
  pub settings: Arc<Settings>,
}

impl AppState {
  pub fn new(pool: ConnectionPool, settings: Settings) -> Self {
    AppState {
      pool,
      registry: ConnectionRegistry::new(),
      settings: Arc::new(settings),
    }
  }
}

pub fn router(state: AppState) -> Router {
  let cors = cors_layer(&state.settings.allowed_origins);

  Router::new()
    .route("/", get(root))
    .route("/health", get(health_check))
    .route("/api/rooms", get(room::list_rooms))
    .route("/api/rooms/", get(room::list_rooms))
    .route("/api/rooms/create", post(room::create_room))
    .route(
      "/api/rooms/:room_id",
      get(room::get_room).delete(room::delete_room),
    )
    .route("/api/rooms/:room_id/code", put(room::update_code))
    .route("/api/rooms/:room_id/members", get(room::list_members))
    .route(
      "/api/rooms/:room_id/members/:user_id",
      post(room::add_member).delete(room::remove_member),
    )
    .route("/api/users", post(user::create_user))
    .route("/api/users/:user_id", get(user::get_user))
    .route(
      "/api/autocomplete/suggestions",
      post(autocomplete::get_suggestions),
    )
    .route(
      "/api/autocomplete/:room_id/:line_number",
      get(autocomplete::get_code_context),
    )
    .route("/ws/editor/:room_id", get(editor::editor_socket))
    .route(
      "/ws/rooms/:room_id/connections",
      get(editor::room_connections),
    )
    .layer(TraceLayer::new_for_http())
    .layer(cors)
    .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
  let origins: Vec<HeaderValue> = origins
    .iter()
    .filter_map(|origin| match HeaderValue::from_str(origin) {
      Ok(value) => Some(value),
      Err(_) => {
        tracing::warn!(%origin, "ignoring invalid CORS origin");
        None
      }
    })
    .collect();

  CorsLayer::new()
    .allow_origin(AllowOrigin::list(origins))
    .allow_credentials(true)
    .allow_methods(AllowMethods::mirror_request())
    .allow_headers(AllowHeaders::mirror_request())
}

async fn root(State(settings): State<Arc<Settings>>) -> Json<Value> {
  Json(json!({
    "app": settings.app_title,
    "version": settings.app_version,
    "message": "Welcome to Collaborative Code Editor API",
  }))
}

async fn health_check(State(settings): State<Arc<Settings>>) -> Json<Value> {
  Json(json!({
    "status": "healthy",
    "app": settings.app_title,
  }))
}
