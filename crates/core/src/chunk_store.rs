use std::collections::HashMap;

use hindsight_entities::chunk;
use hindsight_shared::AppError;
use sea_orm::{DatabaseTransaction, EntityTrait, Set};
use uuid::Uuid;

use crate::types::{ChunkExtraction, ChunkIdMap};

/// Persists one chunk row per `ChunkExtraction` and returns the mapping from
/// the chunker's `chunk_index` to the row's surrogate id, so later steps can
/// attach `chunk_id` to facts without a second round-trip.
pub async fn store_chunks_batch(
  bank_id: &str,
  document_id: Uuid,
  chunks: &[ChunkExtraction],
  db: &DatabaseTransaction,
) -> Result<ChunkIdMap, AppError> {
  let now = chrono::Utc::now();

  let mut map = HashMap::with_capacity(chunks.len());
  let mut models = Vec::with_capacity(chunks.len());

  for extraction in chunks {
    let id = Uuid::now_v7();
    map.insert(extraction.chunk_index, id);

    models.push(chunk::ActiveModel {
      id: Set(id),
      bank_id: Set(bank_id.to_owned()),
      document_id: Set(document_id),
      chunk_index: Set(extraction.chunk_index as i32),
      chunk_text: Set(extraction.chunk_text.clone()),
      created_at: Set(now.into()),
    });
  }

  if !models.is_empty() {
    chunk::Entity::insert_many(models).exec(db).await?;
  }

  Ok(map)
}

/// Resolves each fact's `chunk_index` to the `chunk_id` stored for it. Facts
/// whose chunk somehow has no entry (should not happen — every chunk that
/// produces facts is stored first) are left without a `chunk_id` rather than
/// failing the batch.
pub fn map_facts_to_chunks(chunk_indices: &[usize], chunk_ids: &ChunkIdMap) -> Vec<Option<Uuid>> {
  chunk_indices
    .iter()
    .map(|index| chunk_ids.get(index).copied())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn maps_known_indices_and_leaves_unknown_as_none() {
    let mut chunk_ids = ChunkIdMap::new();
    let a = Uuid::now_v7();
    chunk_ids.insert(0, a);

    let resolved = map_facts_to_chunks(&[0, 0, 1], &chunk_ids);
    assert_eq!(resolved, vec![Some(a), Some(a), None]);
  }
}
