use sea_orm::entity::prelude::*;

/// A bank-scoped normalized proper-noun referent (spec §3 Entity). Generic
/// relations ("mom", "friend") and common nouns are never promoted here —
/// enforced by the entity resolver, not by this table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "entities")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: Uuid,
  pub bank_id: String,
  pub name: String,
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
  #[sea_orm(has_many = "super::entity_link::Entity")]
  EntityLink,
}

impl Related<super::bank::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Bank.def()
  }
}

impl Related<super::entity_link::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::EntityLink.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
