use sea_orm_migration::prelude::*;

mod m20261001_create_cache_tables;
mod m20261008_add_recency_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_create_cache_tables::Migration),
            Box::new(m20261008_add_recency_indexes::Migration),
        ]
    }
}
