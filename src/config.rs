//! Process configuration, read from the environment (and `.env` via dotenv).

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use derive_more::Display;
use tokio_postgres::Config;

use crate::helpers::split_list;

const DEFAULT_APP_TITLE: &str = "Collaborative Code Editor";
const DEFAULT_APP_VERSION: &str = "1.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_ORIGINS: [&str; 4] = [
  "http://localhost:3000",
  "http://localhost:8000",
  "http://127.0.0.1:3000",
  "http://127.0.0.1:8000",
];

#[derive(Debug, Display, PartialEq, Eq)]
pub enum ConfigError {
  #[display(fmt = "missing environment variable {}", _0)]
  Missing(String),
  #[display(fmt = "invalid value {:?} for {}", value, key)]
  Invalid { key: String, value: String },
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Settings {
  pub app_title: String,
  pub app_version: String,
  pub host: IpAddr,
  pub port: u16,
  pub allowed_origins: Vec<String>,
  pub database: DatabaseSettings,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
  pub user: String,
  pub password: String,
  pub host: String,
  pub port: u16,
  pub dbname: String,
}

impl Settings {
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Builds settings from an arbitrary key lookup.
  pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let allowed_origins = match lookup("ALLOWED_ORIGINS") {
      Some(raw) => split_list(&raw),
      None => DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect(),
    };
    Ok(Settings {
      app_title: lookup("APP_TITLE").unwrap_or_else(|| DEFAULT_APP_TITLE.to_owned()),
      app_version: lookup("APP_VERSION").unwrap_or_else(|| DEFAULT_APP_VERSION.to_owned()),
      host: parse_or(&lookup, "HOST", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?,
      port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
      allowed_origins,
      database: DatabaseSettings::from_lookup(&lookup)?,
    })
  }

  pub fn socket_addr(&self) -> SocketAddr {
    SocketAddr::new(self.host, self.port)
  }
}

impl DatabaseSettings {
  fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let port = required(lookup, "POSTGRES_PORT")?;
    Ok(DatabaseSettings {
      user: required(lookup, "POSTGRES_USER")?,
      password: required(lookup, "POSTGRES_PASSWORD")?,
      host: required(lookup, "POSTGRES_HOST")?,
      port: parse_value("POSTGRES_PORT", port)?,
      dbname: required(lookup, "POSTGRES_DB")?,
    })
  }

  pub fn pg_config(&self) -> Config {
    let mut config = Config::default();
    config
      .host(&self.host)
      .port(self.port)
      .user(&self.user)
      .password(&self.password)
      .dbname(&self.dbname);
    config
  }
}

fn required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
  F: Fn(&str) -> Option<String>,
{
  lookup(key).ok_or_else(|| ConfigError::Missing(key.to_owned()))
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
  F: Fn(&str) -> Option<String>,
  T: FromStr,
{
  match lookup(key) {
    Some(value) => parse_value(key, value),
    None => Ok(default),
  }
}

fn parse_value<T: FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
  value.trim().parse().map_err(|_| ConfigError::Invalid {
    key: key.to_owned(),
    value,
  })
}
