use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PurchaseEventDedup::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseEventDedup::EventId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PurchaseEventDedup::TransactionId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseEventDedup::EventName)
                            .string()
                            .not_null()
                            .default("Purchase"),
                    )
                    .col(ColumnDef::new(PurchaseEventDedup::Value).double())
                    .col(
                        ColumnDef::new(PurchaseEventDedup::Currency)
                            .string()
                            .not_null()
                            .default("BRL"),
                    )
                    .col(
                        ColumnDef::new(PurchaseEventDedup::Source)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PurchaseEventDedup::Fbp).string())
                    .col(ColumnDef::new(PurchaseEventDedup::Fbc).string())
                    .col(ColumnDef::new(PurchaseEventDedup::ExternalId).string())
                    .col(ColumnDef::new(PurchaseEventDedup::IpAddress).string())
                    .col(ColumnDef::new(PurchaseEventDedup::UserAgent).string())
                    .col(
                        ColumnDef::new(PurchaseEventDedup::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseEventDedup::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(PurchaseEventDedup::Table)
                    .col(PurchaseEventDedup::TransactionId)
                    .name("idx_purchase_event_dedup_transaction_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PurchaseEventDedup::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PurchaseEventDedup {
    Table,
    EventId,
    TransactionId,
    EventName,
    Value,
    Currency,
    Source,
    Fbp,
    Fbc,
    ExternalId,
    IpAddress,
    UserAgent,
    CreatedAt,
    ExpiresAt,
}
