use sea_orm::entity::prelude::*;

/// A text segment produced by the chunker (spec §3 Chunk). `chunk_index` is
/// dense and monotonic per document, starting at 0.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "chunks")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: Uuid,
  pub bank_id: String,
  pub document_id: Uuid,
  pub chunk_index: i32,
  pub chunk_text: String,
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
  #[sea_orm(has_many = "super::unit::Entity")]
  Unit,
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

impl Related<super::unit::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Unit.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
