use sea_orm::entity::prelude::*;

/// An isolation namespace: one per agent or per user-agent pair (spec §3 Bank).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "banks")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: String,
  /// Owner agent's self-reference; required by the extraction prompt.
  pub name: String,
  pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::document::Entity")]
  Document,
  #[sea_orm(has_many = "super::chunk::Entity")]
  Chunk,
  #[sea_orm(has_many = "super::unit::Entity")]
  Unit,
  #[sea_orm(has_many = "super::entity::Entity")]
  Entity,
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

impl Related<super::unit::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Unit.def()
  }
}

impl Related<super::entity::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Entity.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
