//! Conversion tracking gateway.
//!
//! Receives pixel call batches and server-side purchase events, deduplicates
//! them against a Postgres ledger, and forwards fresh events to the ad
//! platform's Conversions API. Attribution touches (fbp/fbc cookies, UTM
//! parameters, contact data) are held in Redis and merged into outgoing
//! events when the browser-side data is incomplete.

pub mod config;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod infra;
pub mod router;
pub mod state;
pub mod usecase;
