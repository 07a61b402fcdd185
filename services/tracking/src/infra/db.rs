use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use rastro_domain::pagination::PageRequest;
use rastro_tracking_schema::purchase_event_dedup;

use crate::domain::repository::DedupRepository;
use crate::domain::types::{DedupRecord, EventSource};
use crate::error::TrackingServiceError;

/// Postgres-backed dedup ledger.
#[derive(Clone)]
pub struct DbDedupRepository {
    pub db: DatabaseConnection,
}

impl DedupRepository for DbDedupRepository {
    async fn insert_if_absent(&self, record: &DedupRecord) -> Result<bool, TrackingServiceError> {
        // An expired leftover must not shadow a fresh event with the same id.
        purchase_event_dedup::Entity::delete_many()
            .filter(purchase_event_dedup::Column::EventId.eq(&record.event_id))
            .filter(purchase_event_dedup::Column::ExpiresAt.lte(record.created_at))
            .exec(&self.db)
            .await
            .context("failed to clear expired dedup row")?;

        let row = purchase_event_dedup::ActiveModel {
            event_id: Set(record.event_id.clone()),
            transaction_id: Set(record.transaction_id.clone()),
            event_name: Set(record.event_name.clone()),
            value: Set(record.value),
            currency: Set(record.currency.clone()),
            source: Set(record.source.as_str().to_owned()),
            fbp: Set(record.fbp.clone()),
            fbc: Set(record.fbc.clone()),
            external_id: Set(record.external_id.clone()),
            ip_address: Set(record.ip_address.clone()),
            user_agent: Set(record.user_agent.clone()),
            created_at: Set(record.created_at),
            expires_at: Set(record.expires_at),
        };

        // Losing the insert race reads as a duplicate, same as finding the row.
        let inserted = purchase_event_dedup::Entity::insert(row)
            .on_conflict(
                OnConflict::column(purchase_event_dedup::Column::EventId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .context("failed to insert dedup row")?;

        Ok(inserted > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, TrackingServiceError> {
        let result = purchase_event_dedup::Entity::delete_many()
            .filter(purchase_event_dedup::Column::ExpiresAt.lte(now))
            .exec(&self.db)
            .await
            .context("failed to purge expired dedup rows")?;

        Ok(result.rows_affected)
    }

    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<DedupRecord>, TrackingServiceError> {
        let model = purchase_event_dedup::Entity::find_by_id(event_id.to_owned())
            .one(&self.db)
            .await
            .context("failed to find dedup row")?;

        model.map(record_from_model).transpose()
    }

    async fn list_by_transaction(
        &self,
        transaction_id: &str,
        page: PageRequest,
    ) -> Result<Vec<DedupRecord>, TrackingServiceError> {
        let models = purchase_event_dedup::Entity::find()
            .filter(purchase_event_dedup::Column::TransactionId.eq(transaction_id))
            .order_by_desc(purchase_event_dedup::Column::CreatedAt)
            .offset(page.offset())
            .limit(u64::from(page.per_page))
            .all(&self.db)
            .await
            .context("failed to list dedup rows by transaction")?;

        models.into_iter().map(record_from_model).collect()
    }
}

fn record_from_model(
    model: purchase_event_dedup::Model,
) -> Result<DedupRecord, TrackingServiceError> {
    let source = EventSource::from_str(&model.source).ok_or_else(|| {
        TrackingServiceError::Internal(anyhow::anyhow!(
            "unknown event source {:?} in dedup row {}",
            model.source,
            model.event_id
        ))
    })?;

    Ok(DedupRecord {
        event_id: model.event_id,
        transaction_id: model.transaction_id,
        event_name: model.event_name,
        value: model.value,
        currency: model.currency,
        source,
        fbp: model.fbp,
        fbc: model.fbc,
        external_id: model.external_id,
        ip_address: model.ip_address,
        user_agent: model.user_agent,
        created_at: model.created_at,
        expires_at: model.expires_at,
    })
}
