use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hindsight_shared::AppError;
use sea_orm::prelude::PgVector;

use crate::types::Fact;

/// The embedding model black box: batch text in, fixed-dimension vectors
/// out, order preserved.
#[async_trait]
pub trait Embedder: Send + Sync {
  async fn embed_batch(&self, texts: &[String]) -> Result<Vec<PgVector>, AppError>;
}

/// Default `Embedder` backed by an OpenAI-compatible embeddings API.
pub struct OpenAiEmbedder;

#[async_trait]
impl Embedder for OpenAiEmbedder {
  async fn embed_batch(&self, texts: &[String]) -> Result<Vec<PgVector>, AppError> {
    hindsight_ai::embed_many(texts).await
  }
}

/// Prepend a human-readable date derived from `occurred_start` (falling
/// back to `mentioned_at`) to the fact text, so embeddings carry temporal
/// context for semantic recall of "what happened around X" queries.
#[must_use]
pub fn augment(fact: &Fact, format_date: impl Fn(DateTime<Utc>) -> String) -> String {
  let date = fact.occurred_start.unwrap_or(fact.mentioned_at);
  format!("{}: {}", format_date(date), fact.fact_text)
}

/// Augment every fact with its date prefix, preserving order.
#[must_use]
pub fn augment_batch(facts: &[Fact], format_date: impl Fn(DateTime<Utc>) -> String) -> Vec<String> {
  facts.iter().map(|f| augment(f, &format_date)).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::FactType;

  fn sample_fact() -> Fact {
    Fact {
      content_index: 0,
      chunk_index: 0,
      fact_text: "Alice joined the team".to_owned(),
      fact_type: FactType::World,
      mentioned_at: DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap().with_timezone(&Utc),
      occurred_start: None,
      occurred_end: None,
      emotional_significance: None,
      reasoning_motivation: None,
      preferences_opinions: None,
      sensory_details: None,
      observations: None,
      entities: vec![],
      causal_relations: vec![],
    }
  }

  #[test]
  fn prefixes_fact_text_with_formatted_date() {
    let fact = sample_fact();
    let augmented = augment(&fact, |d| d.format("%Y-%m-%d").to_string());
    assert_eq!(augmented, "2024-01-01: Alice joined the team");
  }

  #[test]
  fn prefers_occurred_start_over_mentioned_at() {
    let mut fact = sample_fact();
    fact.occurred_start = Some(DateTime::parse_from_rfc3339("2020-06-15T00:00:00Z").unwrap().with_timezone(&Utc));
    let augmented = augment(&fact, |d| d.format("%Y-%m-%d").to_string());
    assert_eq!(augmented, "2020-06-15: Alice joined the team");
  }
}
