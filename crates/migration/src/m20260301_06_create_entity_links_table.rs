use sea_orm_migration::{prelude::*, schema::float};

use crate::{m20260301_04_create_units_table::Unit, m20260301_05_create_entities_table::EntityRow};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(EntityLink::Table)
          .if_not_exists()
          .col(ColumnDef::new(EntityLink::UnitId).uuid().not_null())
          .col(ColumnDef::new(EntityLink::EntityId).uuid().not_null())
          .col(float(EntityLink::Confidence))
          .primary_key(
            Index::create()
              .col(EntityLink::UnitId)
              .col(EntityLink::EntityId),
          )
          .foreign_key(
            ForeignKey::create()
              .from(EntityLink::Table, EntityLink::UnitId)
              .to(Unit::Table, Unit::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .from(EntityLink::Table, EntityLink::EntityId)
              .to(EntityRow::Table, EntityRow::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(EntityLink::Table).to_owned())
      .await
  }
}

#[derive(Iden)]
pub enum EntityLink {
  Table,
  UnitId,
  EntityId,
  Confidence,
}
