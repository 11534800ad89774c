use sea_orm_migration::{
  prelude::*,
  schema::{integer, string, text, timestamp_with_time_zone, uuid},
};

use crate::{m20260301_01_create_banks_table::Bank, m20260301_02_create_documents_table::Document};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Chunk::Table)
          .if_not_exists()
          .col(uuid(Chunk::Id).primary_key())
          .col(string(Chunk::BankId))
          .col(uuid(Chunk::DocumentId))
          .col(integer(Chunk::ChunkIndex))
          .col(text(Chunk::ChunkText))
          .col(timestamp_with_time_zone(Chunk::CreatedAt).default(Expr::current_timestamp()))
          .foreign_key(
            ForeignKey::create()
              .from(Chunk::Table, Chunk::BankId)
              .to(Bank::Table, Bank::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .from(Chunk::Table, Chunk::DocumentId)
              .to(Document::Table, Document::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_chunks_document_index")
          .table(Chunk::Table)
          .col(Chunk::DocumentId)
          .col(Chunk::ChunkIndex)
          .unique()
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Chunk::Table).to_owned())
      .await
  }
}

#[derive(Iden)]
pub enum Chunk {
  Table,
  Id,
  BankId,
  DocumentId,
  ChunkIndex,
  ChunkText,
  CreatedAt,
}
