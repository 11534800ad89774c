use sea_orm_migration::{
  prelude::*,
  schema::{string, timestamp_with_time_zone},
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Bank::Table)
          .if_not_exists()
          .col(string(Bank::Id).primary_key())
          .col(string(Bank::Name))
          .col(timestamp_with_time_zone(Bank::CreatedAt).default(Expr::current_timestamp()))
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Bank::Table).to_owned())
      .await
  }
}

#[derive(Iden)]
pub enum Bank {
  Table,
  Id,
  Name,
  CreatedAt,
}
