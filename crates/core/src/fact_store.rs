use anyhow::anyhow;
use chrono::Utc;
use hindsight_entities::{bank, chunk, document, unit};
use hindsight_shared::{AppError, ErrorPhase};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::types::ProcessedFact;

/// Creates the bank row if it doesn't already exist. `name` is required by
/// the extraction prompt, so a caller retaining into an unknown bank must
/// supply one the first time.
pub async fn ensure_bank_exists(
  bank_id: &str,
  name: &str,
  db: &DatabaseTransaction,
) -> Result<bank::Model, AppError> {
  if let Some(model) = bank::Entity::find_by_id(bank_id).one(db).await? {
    return Ok(model);
  }

  let active_model = bank::ActiveModel {
    id: Set(bank_id.to_owned()),
    name: Set(name.to_owned()),
    created_at: Set(Utc::now().into()),
  };

  bank::Entity::insert(active_model).exec(db).await?;

  bank::Entity::find_by_id(bank_id)
    .one(db)
    .await?
    .ok_or_else(|| AppError::in_phase(ErrorPhase::FactStorage, anyhow!("failed to ensure bank")))
}

/// Tracks the document's combined raw content: `is_first_batch` upserts
/// (replacing content and cascade-deleting prior chunks/units for this
/// `(bank_id, document_id)` pair — spec invariant 8), otherwise appends to
/// the existing content. Returns the document's surrogate row id.
pub async fn handle_document_tracking(
  bank_id: &str,
  document_id: &str,
  combined_content: &str,
  is_first_batch: bool,
  db: &DatabaseTransaction,
) -> Result<Uuid, AppError> {
  let existing = document::Entity::find()
    .filter(document::Column::BankId.eq(bank_id))
    .filter(document::Column::DocumentId.eq(document_id))
    .one(db)
    .await?;

  if is_first_batch {
    if let Some(existing) = &existing {
      delete_document_children(bank_id, existing.id, db).await?;
    }

    let id = existing.as_ref().map_or_else(Uuid::now_v7, |m| m.id);
    let now = Utc::now();
    let active_model = document::ActiveModel {
      id: Set(id),
      bank_id: Set(bank_id.to_owned()),
      document_id: Set(document_id.to_owned()),
      content: Set(combined_content.to_owned()),
      created_at: Set(now.into()),
      updated_at: Set(now.into()),
    };

    document::Entity::insert(active_model)
      .on_conflict(
        sea_orm::sea_query::OnConflict::columns([document::Column::Id])
          .update_columns([document::Column::Content, document::Column::UpdatedAt])
          .to_owned(),
      )
      .exec(db)
      .await?;

    return Ok(id);
  }

  match existing {
    Some(model) => {
      let appended = format!("{}\n{}", model.content, combined_content);
      let id = model.id;
      let mut active_model: document::ActiveModel = model.into();
      active_model.content = Set(appended);
      active_model.updated_at = Set(Utc::now().into());
      active_model.update(db).await?;
      Ok(id)
    }
    None => {
      let id = Uuid::now_v7();
      let now = Utc::now();
      let active_model = document::ActiveModel {
        id: Set(id),
        bank_id: Set(bank_id.to_owned()),
        document_id: Set(document_id.to_owned()),
        content: Set(combined_content.to_owned()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
      };
      document::Entity::insert(active_model).exec(db).await?;
      Ok(id)
    }
  }
}

/// Deletes prior chunks and units scoped to this document. Entity links and
/// unit links referencing those units cascade via their foreign keys.
async fn delete_document_children(
  bank_id: &str,
  document_row_id: Uuid,
  db: &DatabaseTransaction,
) -> Result<(), AppError> {
  unit::Entity::delete_many()
    .filter(unit::Column::BankId.eq(bank_id))
    .filter(unit::Column::DocumentId.eq(document_row_id))
    .exec(db)
    .await?;

  chunk::Entity::delete_many()
    .filter(chunk::Column::BankId.eq(bank_id))
    .filter(chunk::Column::DocumentId.eq(document_row_id))
    .exec(db)
    .await?;

  Ok(())
}

/// Inserts one unit row per processed (post-dedup) fact, in order, and
/// returns the inserted ids in the same order.
pub async fn insert_facts_batch(
  bank_id: &str,
  document_row_id: Option<Uuid>,
  facts: &[ProcessedFact],
  db: &DatabaseTransaction,
) -> Result<Vec<Uuid>, AppError> {
  let mut ids = Vec::with_capacity(facts.len());
  let mut models = Vec::with_capacity(facts.len());

  for processed in facts {
    let id = Uuid::now_v7();
    ids.push(id);

    let confidence = match processed.fact.fact_type {
      crate::types::FactType::Opinion => processed.confidence,
      _ => None,
    };

    models.push(unit::ActiveModel {
      id: Set(id),
      bank_id: Set(bank_id.to_owned()),
      document_id: Set(document_row_id),
      chunk_id: Set(processed.chunk_id),
      fact_text: Set(processed.fact.fact_text.clone()),
      fact_type: Set(processed.fact.fact_type.as_str().to_owned()),
      embedding: Set(processed.embedding.clone()),
      mentioned_at: Set(processed.fact.mentioned_at.into()),
      occurred_start: Set(processed.fact.occurred_start.map(Into::into)),
      occurred_end: Set(processed.fact.occurred_end.map(Into::into)),
      emotional_significance: Set(processed.fact.emotional_significance.clone()),
      reasoning_motivation: Set(processed.fact.reasoning_motivation.clone()),
      preferences_opinions: Set(processed.fact.preferences_opinions.clone()),
      sensory_details: Set(processed.fact.sensory_details.clone()),
      observations: Set(processed.fact.observations.clone()),
      confidence: Set(confidence),
      created_at: Set(Utc::now().into()),
    });
  }

  if !models.is_empty() {
    unit::Entity::insert_many(models).exec(db).await?;
  }

  Ok(ids)
}
