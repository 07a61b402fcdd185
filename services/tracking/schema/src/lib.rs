//! SeaORM entities owned by the tracking service.

pub mod purchase_event_dedup;
