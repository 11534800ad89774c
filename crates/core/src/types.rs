use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::prelude::PgVector;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One piece of content to retain, as supplied by the caller.
#[derive(Debug, Clone)]
pub struct RetainContent {
  pub content: String,
  pub context: String,
  pub event_date: DateTime<Utc>,
  pub metadata: serde_json::Value,
}

/// A named entity as reported by the extractor, before resolution to a
/// stored `entities` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntity {
  pub text: String,
}

/// Directed causal relationship between two facts emitted by the same
/// extraction call. `target_fact_index` is local to the chunk/content batch
/// the LLM saw; the orchestrator rebases it to a global index before storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CausalRelationKind {
  Causes,
  CausedBy,
  Enables,
  Prevents,
}

impl CausalRelationKind {
  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Causes => "causes",
      Self::CausedBy => "caused_by",
      Self::Enables => "enables",
      Self::Prevents => "prevents",
    }
  }

  #[must_use]
  pub fn parse(raw: &str) -> Option<Self> {
    match raw {
      "causes" => Some(Self::Causes),
      "caused_by" => Some(Self::CausedBy),
      "enables" => Some(Self::Enables),
      "prevents" => Some(Self::Prevents),
      _ => None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct RawCausalRelation {
  pub target_fact_index: usize,
  pub relation_type: CausalRelationKind,
  pub strength: f32,
}

/// Perspective a stored fact is told from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactType {
  World,
  Bank,
  Opinion,
}

impl FactType {
  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::World => "world",
      Self::Bank => "bank",
      Self::Opinion => "opinion",
    }
  }

  #[must_use]
  pub fn parse(raw: &str) -> Option<Self> {
    match raw {
      "world" => Some(Self::World),
      "bank" => Some(Self::Bank),
      "opinion" => Some(Self::Opinion),
      _ => None,
    }
  }
}

/// A fact assembled from one chunk's LLM extraction, after dimension
/// combination and fact_type normalization but before embedding,
/// deduplication or storage.
#[derive(Debug, Clone)]
pub struct Fact {
  pub content_index: usize,
  pub chunk_index: usize,
  pub fact_text: String,
  pub fact_type: FactType,
  pub mentioned_at: DateTime<Utc>,
  pub occurred_start: Option<DateTime<Utc>>,
  pub occurred_end: Option<DateTime<Utc>>,
  pub emotional_significance: Option<String>,
  pub reasoning_motivation: Option<String>,
  pub preferences_opinions: Option<String>,
  pub sensory_details: Option<String>,
  pub observations: Option<String>,
  pub entities: Vec<RawEntity>,
  pub causal_relations: Vec<RawCausalRelation>,
}

/// A chunk of input text alongside how many facts were extracted from it.
#[derive(Debug, Clone)]
pub struct ChunkExtraction {
  pub chunk_text: String,
  pub chunk_index: usize,
  pub fact_count: usize,
}

/// A `Fact` with its embedding attached, chunk assignment resolved, and any
/// caller-supplied overrides applied. Ready for deduplication and storage.
#[derive(Debug, Clone)]
pub struct ProcessedFact {
  pub fact: Fact,
  pub embedding: PgVector,
  pub chunk_id: Option<Uuid>,
  pub confidence: Option<f32>,
}

impl ProcessedFact {
  #[must_use]
  pub fn from_fact(fact: Fact, embedding: PgVector, confidence: Option<f32>) -> Self {
    Self {
      fact,
      embedding,
      chunk_id: None,
      confidence,
    }
  }
}

/// A resolved entity link, pending insertion once its owning unit's id is
/// known.
#[derive(Debug, Clone)]
pub struct EntityLinkCandidate {
  pub unit_index: usize,
  pub entity_id: Uuid,
  pub confidence: f32,
}

/// Maps local extraction-time chunk indices to their stored chunk rows.
pub type ChunkIdMap = HashMap<usize, Uuid>;
