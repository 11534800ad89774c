use sea_orm_migration::{
  prelude::*,
  schema::{string, text, timestamp_with_time_zone, uuid},
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
          .table(Document::Table)
          .if_not_exists()
          .col(uuid(Document::Id).primary_key())
          .col(string(Document::BankId))
          .col(string(Document::DocumentId))
          .col(text(Document::Content))
          .col(timestamp_with_time_zone(Document::CreatedAt).default(Expr::current_timestamp()))
          .col(timestamp_with_time_zone(Document::UpdatedAt).default(Expr::current_timestamp()))
          .foreign_key(
            ForeignKey::create()
              .from(Document::Table, Document::BankId)
              .to(Bank::Table, Bank::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_documents_bank_document")
          .table(Document::Table)
          .col(Document::BankId)
          .col(Document::DocumentId)
          .unique()
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Document::Table).to_owned())
      .await
  }
}

#[derive(Iden)]
pub enum Document {
  Table,
  Id,
  BankId,
  DocumentId,
  Content,
  CreatedAt,
  UpdatedAt,
}
