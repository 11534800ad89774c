use sea_orm_migration::{
  prelude::*,
  schema::{float, string, timestamp_with_time_zone, uuid},
};

use crate::{m20260301_01_create_banks_table::Bank, m20260301_04_create_units_table::Unit};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(UnitLink::Table)
          .if_not_exists()
          .col(uuid(UnitLink::Id).primary_key())
          .col(string(UnitLink::BankId))
          .col(ColumnDef::new(UnitLink::SrcUnitId).uuid().not_null())
          .col(ColumnDef::new(UnitLink::DstUnitId).uuid().not_null())
          .col(string(UnitLink::Kind))
          .col(float(UnitLink::Weight))
          .col(ColumnDef::new(UnitLink::SubKind).string().null())
          .col(ColumnDef::new(UnitLink::Metadata).json_binary().null())
          .col(timestamp_with_time_zone(UnitLink::CreatedAt).default(Expr::current_timestamp()))
          .foreign_key(
            ForeignKey::create()
              .from(UnitLink::Table, UnitLink::BankId)
              .to(Bank::Table, Bank::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .from(UnitLink::Table, UnitLink::SrcUnitId)
              .to(Unit::Table, Unit::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .from(UnitLink::Table, UnitLink::DstUnitId)
              .to(Unit::Table, Unit::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_unit_links_src_kind")
          .table(UnitLink::Table)
          .col(UnitLink::SrcUnitId)
          .col(UnitLink::Kind)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(UnitLink::Table).to_owned())
      .await
  }
}

#[derive(Iden)]
pub enum UnitLink {
  Table,
  Id,
  BankId,
  SrcUnitId,
  DstUnitId,
  Kind,
  Weight,
  SubKind,
  Metadata,
  CreatedAt,
}
