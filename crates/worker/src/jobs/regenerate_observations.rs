use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::WorkerError;

// ──────────────────────────────────────────────────
// Job definition
// ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegenerateObservationsJob {
  pub bank_id: String,
  pub entity_ids: Vec<Uuid>,
  pub min_facts: u32,
}

// ──────────────────────────────────────────────────
// Job processing
// ──────────────────────────────────────────────────

/// Regenerating an entity's observation summary is owned by whatever runs
/// on top of this worker; this records receipt only.
pub async fn process_regenerate_observations(job: RegenerateObservationsJob) -> Result<(), WorkerError> {
  tracing::info!(
    bank_id = %job.bank_id,
    entities = job.entity_ids.len(),
    min_facts = job.min_facts,
    "received regenerate_observations task"
  );

  Ok(())
}
