use sea_orm::entity::prelude::*;

/// Optional grouping for facts produced from the same logical source
/// (spec §3 Document). `document_id` is caller-supplied and bank-scoped;
/// `(bank_id, document_id)` is the natural key, `id` is a surrogate primary
/// key so chunks/units can hold a single FK column.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "documents")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: Uuid,
  pub bank_id: String,
  pub document_id: String,
  pub content: String,
  pub created_at: DateTimeWithTimeZone,
  pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::bank::Entity",
    from = "Column::BankId",
    to = "super::bank::Column::Id"
  )]
  Bank,
  #[sea_orm(has_many = "super::chunk::Entity")]
  Chunk,
  #[sea_orm(has_many = "super::unit::Entity")]
  Unit,
}

impl Related<super::bank::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Bank.def()
  }
}

impl Related<super::chunk::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Chunk.def()
  }
}

impl Related<super::unit::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Unit.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
