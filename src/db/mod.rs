use crate::config::DatabaseSettings;
use crate::errors::StartupError;
use crate::ConnectionPool;

use bb8::{ManageConnection, Pool};
use bb8_postgres::PostgresConnectionManager;

use tokio_postgres::NoTls;
use tokio_postgres_migration::Migration;

pub mod code_edit;
pub mod member;
pub mod room;
pub mod user;

const SCRIPTS_UP: [(&str, &str); 4] = [
  (
    "users",
    include_str!("../../migrations/2024-03-11-090100_users/up.sql"),
  ),
  (
    "rooms",
    include_str!("../../migrations/2024-03-11-090200_rooms/up.sql"),
  ),
  (
    "room_members",
    include_str!("../../migrations/2024-03-11-090300_room_members/up.sql"),
  ),
  (
    "code_edits",
    include_str!("../../migrations/2024-03-11-090400_code_edits/up.sql"),
  ),
];

pub async fn setup_conn_pool(settings: &DatabaseSettings) -> Result<ConnectionPool, StartupError> {
  let manager = PostgresConnectionManager::new(settings.pg_config(), NoTls);
  let mut connection = manager.connect().await?;
  run_migrations(&mut connection).await?;

  let pool = Pool::builder().build(manager).await?;
  tracing::info!(
    host = %settings.host,
    port = settings.port,
    dbname = %settings.dbname,
    "database pool ready"
  );
  Ok(pool)
}

pub async fn run_migrations(
  client: &mut tokio_postgres::Client,
) -> Result<(), tokio_postgres::Error> {
  let migration = Migration::new("schema_migrations".to_string());
  // execute non existing migrations
  migration.up(client, &SCRIPTS_UP).await?;
  Ok(())
}
