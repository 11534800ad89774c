use sea_orm::entity::prelude::*;

/// The primary memory object (spec §3 Fact/Unit).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "units")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: Uuid,
  pub bank_id: String,
  pub document_id: Option<Uuid>,
  pub chunk_id: Option<Uuid>,

  pub fact_text: String,
  /// `world` | `bank` | `opinion` — normalized on ingress, never the raw
  /// LLM-emitted `"assistant"` (spec invariant 6).
  pub fact_type: String,

  #[sea_orm(column_type = "Custom(\"vector(1024)\".to_owned())")]
  pub embedding: PgVector,

  /// When the source utterance occurred. Never null (spec invariant 1).
  pub mentioned_at: DateTimeWithTimeZone,
  /// When the referenced event occurred; only set for `fact_kind = event`.
  pub occurred_start: Option<DateTimeWithTimeZone>,
  pub occurred_end: Option<DateTimeWithTimeZone>,

  pub emotional_significance: Option<String>,
  pub reasoning_motivation: Option<String>,
  pub preferences_opinions: Option<String>,
  pub sensory_details: Option<String>,
  pub observations: Option<String>,

  /// Used for opinions; optional otherwise (spec Open Question #2).
  pub confidence: Option<f32>,

  pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::bank::Entity",
    from = "Column::BankId",
    to = "super::bank::Column::Id"
  )]
  Bank,
  #[sea_orm(
    belongs_to = "super::document::Entity",
    from = "Column::DocumentId",
    to = "super::document::Column::Id"
  )]
  Document,
  #[sea_orm(
    belongs_to = "super::chunk::Entity",
    from = "Column::ChunkId",
    to = "super::chunk::Column::Id"
  )]
  Chunk,
  #[sea_orm(has_many = "super::entity_link::Entity")]
  EntityLink,
}

impl Related<super::bank::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Bank.def()
  }
}

impl Related<super::document::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Document.def()
  }
}

impl Related<super::chunk::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Chunk.def()
  }
}

impl Related<super::entity_link::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::EntityLink.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
