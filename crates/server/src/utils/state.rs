use hindsight_worker::HindsightJob;
use sea_orm::DatabaseConnection;

use apalis_postgres::PostgresStorage;

#[derive(Clone)]
pub struct AppState {
  pub db: DatabaseConnection,
  pub job_storage: PostgresStorage<HindsightJob>,
}

impl AppState {
  #[must_use]
  pub const fn new(db: DatabaseConnection, job_storage: PostgresStorage<HindsightJob>) -> Self {
    Self { db, job_storage }
  }
}
