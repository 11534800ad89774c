use sea_orm::entity::prelude::*;

/// `(unit_id, entity_id, confidence)` — spec §3 Entity Link.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "entity_links")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub unit_id: Uuid,
  #[sea_orm(primary_key, auto_increment = false)]
  pub entity_id: Uuid,
  pub confidence: f32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::unit::Entity",
    from = "Column::UnitId",
    to = "super::unit::Column::Id"
  )]
  Unit,
  #[sea_orm(
    belongs_to = "super::entity::Entity",
    from = "Column::EntityId",
    to = "super::entity::Column::Id"
  )]
  Entity,
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
