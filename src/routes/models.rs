use serde::{Deserialize, Serialize};

const DEFAULT_LANGUAGE: &str = "javascript";

fn default_language() -> String {
  DEFAULT_LANGUAGE.to_owned()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomRequest {
  pub room_name: String,
  #[serde(default = "default_language")]
  pub language: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCodeRequest {
  #[serde(default)]
  pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUserRequest {
  pub username: String,
  pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionRequest {
  pub language: String,
  pub prefix: String,
  #[serde(default)]
  pub room_id: Option<String>,
}
