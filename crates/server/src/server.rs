use apalis_postgres::PostgresStorage;
use hindsight_shared::AppError;
use hindsight_worker::HindsightJob;
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::api;
use crate::utils::{AppState, shutdown_signal};

pub async fn server(db: DatabaseConnection, job_storage: PostgresStorage<HindsightJob>) -> Result<(), AppError> {
  let state = AppState::new(db, job_storage);
  let app = api::app().with_state(state);

  let listener = tokio::net::TcpListener::bind("0.0.0.0:8787")
    .await
    .map_err(AppError::from)?;

  info!(addr = %listener.local_addr().map_err(AppError::from)?, "server listening");

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(AppError::from)?;

  Ok(())
}
