pub use sea_orm_migration::*;

mod m20260301_01_create_banks_table;
mod m20260301_02_create_documents_table;
mod m20260301_03_create_chunks_table;
mod m20260301_04_create_units_table;
mod m20260301_05_create_entities_table;
mod m20260301_06_create_entity_links_table;
mod m20260301_07_create_unit_links_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20260301_01_create_banks_table::Migration),
      Box::new(m20260301_02_create_documents_table::Migration),
      Box::new(m20260301_03_create_chunks_table::Migration),
      Box::new(m20260301_04_create_units_table::Migration),
      Box::new(m20260301_05_create_entities_table::Migration),
      Box::new(m20260301_06_create_entity_links_table::Migration),
      Box::new(m20260301_07_create_unit_links_table::Migration),
    ]
  }
}
