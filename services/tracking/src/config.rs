/// Tracking service configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct TrackingConfig {
    /// Postgres connection string.
    pub database_url: String,
    /// Redis connection string (attribution touch store).
    pub redis_url: String,
    /// Port the HTTP server binds on.
    pub tracking_port: u16,
    /// Base URL of the Conversions API endpoint.
    pub capi_base_url: String,
    /// Pixel id events are reported under.
    pub capi_pixel_id: String,
    /// Access token for the Conversions API.
    pub capi_access_token: String,
    /// When set, dispatched events land in the platform's test event view
    /// instead of the live pipeline.
    pub capi_test_event_code: Option<String>,
    /// How long a dedup row blocks re-dispatch of the same event id, in hours.
    pub dedup_ttl_hours: i64,
    /// Run the expired-row purge once per this many successful inserts.
    pub dedup_purge_every: u64,
    /// Lifetime of an attribution touch in Redis, in seconds.
    pub attribution_ttl_secs: u64,
}

impl TrackingConfig {
    /// Loads configuration from the environment. Panics on missing required
    /// variables; this runs before the server binds, so failing loud is the
    /// right behavior.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            redis_url: std::env::var("REDIS_URL").expect("REDIS_URL must be set"),
            tracking_port: std::env::var("TRACKING_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3170),
            capi_base_url: std::env::var("CAPI_BASE_URL")
                .unwrap_or_else(|_| "https://graph.facebook.com/v21.0".to_owned()),
            capi_pixel_id: std::env::var("CAPI_PIXEL_ID").expect("CAPI_PIXEL_ID must be set"),
            capi_access_token: std::env::var("CAPI_ACCESS_TOKEN")
                .expect("CAPI_ACCESS_TOKEN must be set"),
            capi_test_event_code: std::env::var("CAPI_TEST_EVENT_CODE").ok(),
            dedup_ttl_hours: std::env::var("DEDUP_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),
            dedup_purge_every: std::env::var("DEDUP_PURGE_EVERY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(50),
            attribution_ttl_secs: std::env::var("ATTRIBUTION_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(604_800),
        }
    }
}
