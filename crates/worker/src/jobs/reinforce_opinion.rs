use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::WorkerError;

// ──────────────────────────────────────────────────
// Job definition
// ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReinforceOpinionJob {
  pub bank_id: String,
  pub created_unit_ids: Vec<Uuid>,
  pub unit_texts: Vec<String>,
  pub unit_entities: Vec<Vec<String>>,
}

// ──────────────────────────────────────────────────
// Job processing
// ──────────────────────────────────────────────────

/// Reinforcing an opinion's weight against the bank's existing opinions is
/// owned by whatever runs on top of this worker; this records receipt only.
pub async fn process_reinforce_opinion(job: ReinforceOpinionJob) -> Result<(), WorkerError> {
  tracing::info!(
    bank_id = %job.bank_id,
    units = job.created_unit_ids.len(),
    "received reinforce_opinion task"
  );

  Ok(())
}
