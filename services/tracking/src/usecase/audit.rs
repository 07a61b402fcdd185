use rastro_domain::pagination::PageRequest;

use crate::domain::repository::DedupRepository;
use crate::domain::types::DedupRecord;
use crate::error::TrackingServiceError;

/// Fetch one ledger row by event id.
///
/// Expired rows still come back until the purge removes them; the ledger is
/// the audit trail of what was actually recorded, not a liveness check.
pub struct GetEventUseCase<D: DedupRepository> {
    pub dedup: D,
}

impl<D: DedupRepository> GetEventUseCase<D> {
    pub async fn execute(&self, event_id: &str) -> Result<DedupRecord, TrackingServiceError> {
        self.dedup
            .find_by_event_id(event_id)
            .await?
            .ok_or(TrackingServiceError::EventNotFound)
    }
}

/// List ledger rows for a transaction, newest first.
pub struct ListTransactionEventsUseCase<D: DedupRepository> {
    pub dedup: D,
}

impl<D: DedupRepository> ListTransactionEventsUseCase<D> {
    pub async fn execute(
        &self,
        transaction_id: &str,
        page: PageRequest,
    ) -> Result<Vec<DedupRecord>, TrackingServiceError> {
        self.dedup
            .list_by_transaction(transaction_id, page.clamped())
            .await
    }
}
