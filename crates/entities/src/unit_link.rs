use sea_orm::entity::prelude::*;

/// `(src_unit_id, dst_unit_id, kind, weight, metadata?)` — spec §3 Fact Link.
/// `kind` is one of `temporal` | `semantic` | `causal`; for causal links
/// `sub_kind` carries `causes` | `caused_by` | `enables` | `prevents`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "unit_links")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: Uuid,
  pub bank_id: String,
  pub src_unit_id: Uuid,
  pub dst_unit_id: Uuid,
  pub kind: String,
  pub weight: f32,
  pub sub_kind: Option<String>,
  pub metadata: Option<Json>,
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
    belongs_to = "super::unit::Entity",
    from = "Column::SrcUnitId",
    to = "super::unit::Column::Id"
  )]
  SrcUnit,
  #[sea_orm(
    belongs_to = "super::unit::Entity",
    from = "Column::DstUnitId",
    to = "super::unit::Column::Id"
  )]
  DstUnit,
}

impl Related<super::bank::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Bank.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
