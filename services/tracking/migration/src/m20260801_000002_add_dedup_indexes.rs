use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .table(PurchaseEventDedup::Table)
                    .col(PurchaseEventDedup::ExpiresAt)
                    .name("idx_purchase_event_dedup_expires_at")
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .table(PurchaseEventDedup::Table)
                    .col(PurchaseEventDedup::Source)
                    .name("idx_purchase_event_dedup_source")
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .table(PurchaseEventDedup::Table)
                    .col(PurchaseEventDedup::EventId)
                    .col(PurchaseEventDedup::Source)
                    .name("idx_purchase_event_dedup_event_id_source")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_purchase_event_dedup_event_id_source")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_purchase_event_dedup_source")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_purchase_event_dedup_expires_at")
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum PurchaseEventDedup {
    Table,
    EventId,
    Source,
    ExpiresAt,
}
