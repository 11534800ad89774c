//! Hosts the apalis job definitions and handlers the retain pipeline's
//! `TaskBackend` seam enqueues into. What a reinforcement or regeneration
//! job actually does with the facts it's handed is owned elsewhere — these
//! handlers only record receipt.

pub mod jobs;

use std::time::Duration;

use apalis::prelude::{Monitor, TaskSink, WorkerBuilder};
use apalis_postgres::PostgresStorage;
use async_trait::async_trait;
use hindsight_core::{BackgroundTask, TaskBackend};
use hindsight_shared::AppError;
use serde::{Deserialize, Serialize};

pub use jobs::{ReinforceOpinionJob, RegenerateObservationsJob, WorkerError};

/// The one job type this worker's queue carries, dispatching to whichever
/// background task the retain pipeline submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HindsightJob {
  ReinforceOpinion(ReinforceOpinionJob),
  RegenerateObservations(RegenerateObservationsJob),
}

/// `TaskBackend` implementation backed by an `apalis-postgres` queue,
/// shared by both background task kinds.
#[derive(Clone)]
pub struct PostgresTaskBackend {
  storage: PostgresStorage<HindsightJob>,
}

impl PostgresTaskBackend {
  #[must_use]
  pub const fn new(storage: PostgresStorage<HindsightJob>) -> Self {
    Self { storage }
  }
}

#[async_trait]
impl TaskBackend for PostgresTaskBackend {
  async fn submit_task(&self, task: BackgroundTask) -> Result<(), AppError> {
    let job = match task {
      BackgroundTask::ReinforceOpinion {
        bank_id,
        created_unit_ids,
        unit_texts,
        unit_entities,
      } => HindsightJob::ReinforceOpinion(ReinforceOpinionJob {
        bank_id,
        created_unit_ids,
        unit_texts,
        unit_entities,
      }),
      BackgroundTask::RegenerateObservations {
        bank_id,
        entity_ids,
        min_facts,
      } => HindsightJob::RegenerateObservations(RegenerateObservationsJob {
        bank_id,
        entity_ids,
        min_facts,
      }),
    };

    let mut storage = self.storage.clone();
    storage.push(job).await.map_err(AppError::from)?;
    Ok(())
  }
}

/// Runs the worker loop until shut down, dispatching queued jobs to their
/// handlers.
pub async fn worker(backend: PostgresStorage<HindsightJob>) -> Result<(), AppError> {
  Monitor::new()
    .register(move |_run_id| {
      let backend = backend.clone();

      WorkerBuilder::new("hindsight-worker")
        .backend(backend.clone())
        .build(move |job: HindsightJob| async move {
          match job {
            HindsightJob::ReinforceOpinion(job) => jobs::process_reinforce_opinion(job).await,
            HindsightJob::RegenerateObservations(job) => jobs::process_regenerate_observations(job).await,
          }
        })
    })
    .shutdown_timeout(Duration::from_secs(5))
    .run_with_signal(tokio::signal::ctrl_c())
    .await
    .map_err(|err| AppError::new(anyhow::Error::new(err)))?;

  Ok(())
}

