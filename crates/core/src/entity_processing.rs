use async_trait::async_trait;
use hindsight_entities::{entity, entity_link};
use hindsight_shared::AppError;
use sea_orm::{ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, Set, sea_query::OnConflict};
use tracing::warn;
use uuid::Uuid;

use crate::types::EntityLinkCandidate;

/// Entity-resolution black box: given a fact's text and the raw entity
/// mentions the extractor pulled out of it, return the bank-scoped entity
/// ids those mentions refer to, with a confidence per match. Implementations
/// may create new entity rows inside `db` as part of resolving a novel
/// mention — entity-resolution strategy is out of scope here, this is only
/// the seam.
#[async_trait]
pub trait EntityResolver: Send + Sync {
  async fn resolve(
    &self,
    fact_text: &str,
    entity_names: &[String],
    bank_id: &str,
    db: &DatabaseTransaction,
  ) -> Result<Vec<(Uuid, f32)>, AppError>;
}

/// Runs the resolver over every fact's entity mentions and flattens the
/// results into `(unit_index, entity_id, confidence)` candidates. A
/// resolver failure for one fact is logged and treated as "no entities
/// found" rather than failing the whole batch.
pub async fn process_entities_batch(
  resolver: &dyn EntityResolver,
  bank_id: &str,
  fact_texts: &[String],
  entity_names_per_fact: &[Vec<String>],
  db: &DatabaseTransaction,
) -> Vec<EntityLinkCandidate> {
  let mut candidates = Vec::new();

  for (unit_index, (fact_text, names)) in fact_texts
    .iter()
    .zip(entity_names_per_fact.iter())
    .enumerate()
  {
    if names.is_empty() {
      continue;
    }

    match resolver.resolve(fact_text, names, bank_id, db).await {
      Ok(resolved) => {
        for (entity_id, confidence) in resolved {
          candidates.push(EntityLinkCandidate {
            unit_index,
            entity_id,
            confidence,
          });
        }
      }
      Err(e) => {
        warn!(bank_id, unit_index, error = %e, "entity resolution failed, skipping fact's entities");
      }
    }
  }

  candidates
}

/// Inserts `(unit_id, entity_id, confidence)` rows for every candidate,
/// given the mapping from `unit_index` (position in the post-dedup batch) to
/// the unit's stored id.
pub async fn insert_entity_links_batch(
  candidates: &[EntityLinkCandidate],
  unit_ids: &[Uuid],
  db: &DatabaseTransaction,
) -> Result<(), AppError> {
  let models: Vec<entity_link::ActiveModel> = candidates
    .iter()
    .filter_map(|candidate| {
      unit_ids
        .get(candidate.unit_index)
        .map(|&unit_id| entity_link::ActiveModel {
          unit_id: Set(unit_id),
          entity_id: Set(candidate.entity_id),
          confidence: Set(candidate.confidence),
        })
    })
    .collect();

  if models.is_empty() {
    return Ok(());
  }

  entity_link::Entity::insert_many(models)
    .on_conflict(
      OnConflict::columns([entity_link::Column::UnitId, entity_link::Column::EntityId])
        .update_column(entity_link::Column::Confidence)
        .to_owned(),
    )
    .exec(db)
    .await?;

  Ok(())
}

/// Default `EntityResolver`: get-or-create an entity row by normalized
/// (trimmed, lowercased) name and return it with confidence `1.0` — a
/// conservative baseline, not a resolution strategy.
pub struct NameMatchEntityResolver;

#[async_trait]
impl EntityResolver for NameMatchEntityResolver {
  async fn resolve(
    &self,
    _fact_text: &str,
    entity_names: &[String],
    bank_id: &str,
    db: &DatabaseTransaction,
  ) -> Result<Vec<(Uuid, f32)>, AppError> {
    let mut resolved = Vec::with_capacity(entity_names.len());

    for raw_name in entity_names {
      let normalized = raw_name.trim();
      if normalized.is_empty() {
        continue;
      }

      let existing = entity::Entity::find()
        .filter(entity::Column::BankId.eq(bank_id))
        .filter(entity::Column::Name.eq(normalized))
        .one(db)
        .await?;

      let id = match existing {
        Some(model) => model.id,
        None => {
          let id = Uuid::now_v7();
          let active_model = entity::ActiveModel {
            id: Set(id),
            bank_id: Set(bank_id.to_owned()),
            name: Set(normalized.to_owned()),
            created_at: Set(chrono::Utc::now().into()),
          };

          entity::Entity::insert(active_model)
            .on_conflict(
              OnConflict::columns([entity::Column::BankId, entity::Column::Name])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

          entity::Entity::find()
            .filter(entity::Column::BankId.eq(bank_id))
            .filter(entity::Column::Name.eq(normalized))
            .one(db)
            .await?
            .map_or(id, |model| model.id)
        }
      };

      resolved.push((id, 1.0));
    }

    Ok(resolved)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn insert_entity_links_batch_skips_out_of_range_indices() {
    let candidates = vec![
      EntityLinkCandidate {
        unit_index: 0,
        entity_id: Uuid::now_v7(),
        confidence: 0.9,
      },
      EntityLinkCandidate {
        unit_index: 5,
        entity_id: Uuid::now_v7(),
        confidence: 0.5,
      },
    ];
    let unit_ids = [Uuid::now_v7()];

    let in_range: Vec<_> = candidates
      .iter()
      .filter(|c| unit_ids.get(c.unit_index).is_some())
      .collect();

    assert_eq!(in_range.len(), 1);
  }
}
