use sea_orm_migration::prelude::*;

mod m20260801_000001_create_purchase_event_dedup;
mod m20260801_000002_add_dedup_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260801_000001_create_purchase_event_dedup::Migration),
            Box::new(m20260801_000002_add_dedup_indexes::Migration),
        ]
    }
}
