use async_trait::async_trait;
use hindsight_shared::AppError;
use uuid::Uuid;

/// One of the two post-commit jobs the retain pipeline fans out. Their
/// internal logic (what "reinforcing" or "regenerating" actually does) is
/// owned by the worker, not this crate — this is only the submission
/// contract and payload shape.
#[derive(Debug, Clone)]
pub enum BackgroundTask {
  ReinforceOpinion {
    bank_id: String,
    created_unit_ids: Vec<Uuid>,
    unit_texts: Vec<String>,
    unit_entities: Vec<Vec<String>>,
  },
  RegenerateObservations {
    bank_id: String,
    entity_ids: Vec<Uuid>,
    min_facts: u32,
  },
}

/// Task-queue black box: hands a background task off to whatever backs it
/// (Postgres-backed `apalis` queue in production, an in-memory fake in
/// tests). Submission happens after the retain transaction commits, so a
/// failure here must never roll back already-persisted facts — callers log
/// and move on.
#[async_trait]
pub trait TaskBackend: Send + Sync {
  async fn submit_task(&self, task: BackgroundTask) -> Result<(), AppError>;
}
