use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rastro_domain::attribution::UtmParams;
use rastro_domain::normalize::NormalizedUserData;

// ── Event source ─────────────────────────────────────────────────────────────

/// Channel an event arrived through. Browser and server submissions of the
/// same purchase carry the same event id but different sources; the ledger
/// keeps whichever landed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    Pixel,
    Capi,
}

impl EventSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pixel => "pixel",
            Self::Capi => "capi",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pixel" => Some(Self::Pixel),
            "capi" => Some(Self::Capi),
            _ => None,
        }
    }

    /// The `action_source` value the Conversions API expects for this channel.
    pub fn action_source(self) -> &'static str {
        match self {
            Self::Pixel => "website",
            Self::Capi => "chat",
        }
    }
}

// ── Dedup ledger ─────────────────────────────────────────────────────────────

/// One row of the dedup ledger: everything needed to answer "was this event
/// already dispatched" plus enough context for audit queries.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupRecord {
    pub event_id: String,
    /// Empty for named (non-purchase) events.
    pub transaction_id: String,
    pub event_name: String,
    pub value: Option<f64>,
    pub currency: String,
    pub source: EventSource,
    pub fbp: Option<String>,
    pub fbc: Option<String>,
    pub external_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// ── Outgoing conversion event ────────────────────────────────────────────────

/// A conversion event as handed to the outbound port. Match keys are kept in
/// plaintext here; hashing is the wire format's concern, not the domain's.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionEvent {
    pub event_name: String,
    /// Unix seconds.
    pub event_time: i64,
    pub event_id: String,
    pub source: EventSource,
    pub event_source_url: Option<String>,
    pub user: NormalizedUserData,
    pub fbp: Option<String>,
    pub fbc: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub value: Option<f64>,
    pub currency: String,
}

// ── Attribution touch ────────────────────────────────────────────────────────

/// Per-visitor attribution snapshot held in Redis. Merging is field-level
/// last-write-wins: a fresh value replaces the stored one, gaps keep what was
/// there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionTouch {
    pub fbp: Option<String>,
    pub fbc: Option<String>,
    #[serde(default)]
    pub utm: UtmParams,
    #[serde(default)]
    pub user: NormalizedUserData,
    pub captured_at: DateTime<Utc>,
}

impl AttributionTouch {
    pub fn merged_with(self, newer: Self) -> Self {
        Self {
            fbp: newer.fbp.or(self.fbp),
            fbc: newer.fbc.or(self.fbc),
            utm: self.utm.merged_with(newer.utm),
            user: self.user.merged_with(newer.user),
            captured_at: newer.captured_at,
        }
    }
}

// ── Purge cadence ────────────────────────────────────────────────────────────

/// Pacing counter for the opportunistic dedup purge: one purge per `every`
/// successful inserts, shared across handlers.
#[derive(Clone)]
pub struct PurgeCadence {
    every: u64,
    inserts: Arc<AtomicU64>,
}

impl PurgeCadence {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            inserts: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Counts one successful insert; `true` when this insert crossed the
    /// cadence boundary.
    pub fn due(&self) -> bool {
        let n = self.inserts.fetch_add(1, Ordering::Relaxed) + 1;
        n % self.every == 0
    }
}
