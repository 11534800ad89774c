use sea_orm_migration::{
  prelude::*,
  schema::{string, timestamp_with_time_zone, uuid},
};

use crate::m20260301_01_create_banks_table::Bank;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(EntityRow::Table)
          .if_not_exists()
          .col(uuid(EntityRow::Id).primary_key())
          .col(string(EntityRow::BankId))
          .col(string(EntityRow::Name))
          .col(timestamp_with_time_zone(EntityRow::CreatedAt).default(Expr::current_timestamp()))
          .foreign_key(
            ForeignKey::create()
              .from(EntityRow::Table, EntityRow::BankId)
              .to(Bank::Table, Bank::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_entities_bank_name")
          .table(EntityRow::Table)
          .col(EntityRow::BankId)
          .col(EntityRow::Name)
          .unique()
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(EntityRow::Table).to_owned())
      .await
  }
}

#[derive(Iden)]
pub enum EntityRow {
  Table,
  Id,
  BankId,
  Name,
  CreatedAt,
}
