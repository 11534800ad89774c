use sea_orm_migration::{
  prelude::*,
  schema::{float, string, text, timestamp_with_time_zone, uuid},
  sea_orm::Statement,
};

use crate::{
  m20260301_01_create_banks_table::Bank, m20260301_02_create_documents_table::Document,
  m20260301_03_create_chunks_table::Chunk,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Unit::Table)
          .if_not_exists()
          .col(uuid(Unit::Id).primary_key())
          .col(string(Unit::BankId))
          .col(ColumnDef::new(Unit::DocumentId).uuid().null())
          .col(ColumnDef::new(Unit::ChunkId).uuid().null())
          .col(text(Unit::FactText))
          .col(string(Unit::FactType))
          .col(
            ColumnDef::new(Unit::Embedding)
              .custom(Alias::new("vector(1024)"))
              .not_null(),
          )
          .col(timestamp_with_time_zone(Unit::MentionedAt))
          .col(ColumnDef::new(Unit::OccurredStart).timestamp_with_time_zone().null())
          .col(ColumnDef::new(Unit::OccurredEnd).timestamp_with_time_zone().null())
          .col(ColumnDef::new(Unit::EmotionalSignificance).text().null())
          .col(ColumnDef::new(Unit::ReasoningMotivation).text().null())
          .col(ColumnDef::new(Unit::PreferencesOpinions).text().null())
          .col(ColumnDef::new(Unit::SensoryDetails).text().null())
          .col(ColumnDef::new(Unit::Observations).text().null())
          .col(ColumnDef::new(Unit::Confidence).float().null())
          .col(timestamp_with_time_zone(Unit::CreatedAt).default(Expr::current_timestamp()))
          .foreign_key(
            ForeignKey::create()
              .from(Unit::Table, Unit::BankId)
              .to(Bank::Table, Bank::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .from(Unit::Table, Unit::DocumentId)
              .to(Document::Table, Document::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .from(Unit::Table, Unit::ChunkId)
              .to(Chunk::Table, Chunk::Id)
              .on_delete(ForeignKeyAction::SetNull),
          )
          .to_owned(),
      )
      .await?;

    manager
      .get_connection()
      .execute_raw(Statement::from_string(
        manager.get_database_backend(),
        "CREATE INDEX idx_units_embedding ON units USING hnsw (embedding vector_cosine_ops);",
      ))
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_units_bank_mentioned_at")
          .table(Unit::Table)
          .col(Unit::BankId)
          .col(Unit::MentionedAt)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Unit::Table).to_owned())
      .await
  }
}

#[derive(Iden)]
pub enum Unit {
  Table,
  Id,
  BankId,
  DocumentId,
  ChunkId,
  FactText,
  FactType,
  Embedding,
  MentionedAt,
  OccurredStart,
  OccurredEnd,
  EmotionalSignificance,
  ReasoningMotivation,
  PreferencesOpinions,
  SensoryDetails,
  Observations,
  Confidence,
  CreatedAt,
}
