use code_rooms::config::Settings;
use code_rooms::db::setup_conn_pool;
use code_rooms::errors::StartupError;
use code_rooms::routes::{router, AppState};
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
  dotenv().ok();
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  if let Err(err) = run().await {
    tracing::error!(%err, "server failed");
    std::process::exit(1);
  }
}

async fn run() -> Result<(), StartupError> {
  let settings = Settings::from_env()?;

  // set up connection pool
  let pool = setup_conn_pool(&settings.database).await?;

  let addr = settings.socket_addr();
  let app = router(AppState::new(pool, settings));

  tracing::info!(%addr, "listening");
  axum::Server::try_bind(&addr)?
    .serve(app.into_make_service())
    .await?;
  Ok(())
}
