mod reinforce_opinion;
pub use reinforce_opinion::*;

mod regenerate_observations;
pub use regenerate_observations::*;

use hindsight_shared::AppError;

/// Error type for the apalis job boundary. Job handlers use `AppError`
/// internally; this wrapper converts at the worker boundary.
#[derive(Debug)]
pub struct WorkerError(pub AppError);

impl std::fmt::Display for WorkerError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    self.0.fmt(f)
  }
}

impl std::error::Error for WorkerError {}

impl From<AppError> for WorkerError {
  fn from(err: AppError) -> Self {
    Self(err)
  }
}

impl From<anyhow::Error> for WorkerError {
  fn from(err: anyhow::Error) -> Self {
    Self(AppError::new(err))
  }
}
