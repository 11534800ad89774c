use async_trait::async_trait;
use hindsight_shared::AppError;
use sea_orm::DatabaseTransaction;
use tracing::warn;

use crate::types::ProcessedFact;

/// Duplicate-detection black box: given a candidate fact (with its
/// embedding already computed), decide whether an equivalent fact already
/// exists in the bank.
#[async_trait]
pub trait DuplicateChecker: Send + Sync {
  async fn is_duplicate(
    &self,
    bank_id: &str,
    fact: &ProcessedFact,
    db: &DatabaseTransaction,
  ) -> Result<bool, AppError>;
}

/// Check every fact for duplicates. A checker failure is logged and treated
/// as "not a duplicate" — availability over precision, per the retain
/// pipeline's error taxonomy.
pub async fn check_duplicates_batch(
  checker: &dyn DuplicateChecker,
  bank_id: &str,
  facts: &[ProcessedFact],
  db: &DatabaseTransaction,
) -> Vec<bool> {
  let mut flags = Vec::with_capacity(facts.len());
  for fact in facts {
    let is_dup = match checker.is_duplicate(bank_id, fact, db).await {
      Ok(flag) => flag,
      Err(e) => {
        warn!(bank_id, error = %e, "duplicate check failed, treating fact as unique");
        false
      }
    };
    flags.push(is_dup);
  }
  flags
}

/// Split facts into (kept, duplicate) by their corresponding flag, which
/// must be the same length and order as `facts`.
#[must_use]
pub fn filter_duplicates(facts: Vec<ProcessedFact>, flags: &[bool]) -> Vec<ProcessedFact> {
  facts
    .into_iter()
    .zip(flags)
    .filter_map(|(fact, &is_dup)| (!is_dup).then_some(fact))
    .collect()
}

/// Default `DuplicateChecker`: a fact is a duplicate if a unit already
/// exists in the bank whose embedding's cosine distance is within
/// `threshold` AND whose text is near-equivalent by word-overlap (Jaccard
/// on lowercased word sets) at or above `text_threshold`. Vector similarity
/// alone over-matches facts that merely share a topic; this adds the
/// textual leg so only near-identical restatements count as duplicates.
pub struct EmbeddingDuplicateChecker {
  pub threshold: f32,
  pub text_threshold: f64,
}

impl EmbeddingDuplicateChecker {
  #[must_use]
  pub const fn new(threshold: f32, text_threshold: f64) -> Self {
    Self {
      threshold,
      text_threshold,
    }
  }
}

/// Word-overlap similarity between two fact texts: the Jaccard index of
/// their lowercased word sets. `1.0` for two texts with no words at all.
fn word_overlap_similarity(a: &str, b: &str) -> f64 {
  let a_lower = a.to_lowercase();
  let b_lower = b.to_lowercase();
  let a_words: std::collections::HashSet<&str> = a_lower.split_whitespace().collect();
  let b_words: std::collections::HashSet<&str> = b_lower.split_whitespace().collect();

  if a_words.is_empty() && b_words.is_empty() {
    return 1.0;
  }

  let intersection = a_words.intersection(&b_words).count();
  let union = a_words.union(&b_words).count();
  if union == 0 {
    0.0
  } else {
    intersection as f64 / union as f64
  }
}

#[async_trait]
impl DuplicateChecker for EmbeddingDuplicateChecker {
  async fn is_duplicate(
    &self,
    bank_id: &str,
    fact: &ProcessedFact,
    db: &DatabaseTransaction,
  ) -> Result<bool, AppError> {
    use sea_orm::{ConnectionTrait, Statement};

    let rows = db
      .query_all(Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Postgres,
        "SELECT fact_text FROM units WHERE bank_id = $1 AND (embedding <=> $2) <= $3",
        [
          bank_id.into(),
          sea_orm::Value::from(fact.embedding.clone()),
          (1.0 - self.threshold).into(),
        ],
      ))
      .await?;

    for row in rows {
      let existing_text: String = row.try_get("", "fact_text")?;
      if word_overlap_similarity(&existing_text, &fact.fact.fact_text) >= self.text_threshold {
        return Ok(true);
      }
    }

    Ok(false)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::{Fact, FactType};
  use chrono::Utc;
  use sea_orm::prelude::PgVector;

  fn fact(text: &str) -> ProcessedFact {
    ProcessedFact::from_fact(
      Fact {
        content_index: 0,
        chunk_index: 0,
        fact_text: text.to_owned(),
        fact_type: FactType::World,
        mentioned_at: Utc::now(),
        occurred_start: None,
        occurred_end: None,
        emotional_significance: None,
        reasoning_motivation: None,
        preferences_opinions: None,
        sensory_details: None,
        observations: None,
        entities: vec![],
        causal_relations: vec![],
      },
      PgVector::from(vec![0.0; 4]),
      None,
    )
  }

  #[test]
  fn filter_duplicates_keeps_only_unflagged() {
    let facts = vec![fact("a"), fact("b"), fact("c")];
    let kept = filter_duplicates(facts, &[false, true, false]);
    assert_eq!(kept.len(), 2);
    assert_eq!(kept[0].fact.fact_text, "a");
    assert_eq!(kept[1].fact.fact_text, "c");
  }
}
