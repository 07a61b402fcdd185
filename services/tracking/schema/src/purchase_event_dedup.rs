use sea_orm::entity::prelude::*;

/// Dedup ledger for conversion events.
///
/// `event_id` is the primary key on purpose: when the pixel path and the
/// server path report the same conversion, the second insert collides and
/// reads as "already sent". Rows past `expires_at` no longer count as seen.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "purchase_event_dedup")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub event_id: String,
    pub transaction_id: String,
    pub event_name: String,
    pub value: Option<f64>,
    pub currency: String,
    /// Reporting channel: `pixel` or `capi`.
    pub source: String,
    pub fbp: Option<String>,
    pub fbc: Option<String>,
    pub external_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
