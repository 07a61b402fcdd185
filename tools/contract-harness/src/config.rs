//! Contract harness configuration loaded from environment variables.

/// All configuration for the provisioned (container-backed) contract run.
///
/// Loaded from env vars after `dotenv::dotenv().ok()`; no CLI parsing.
/// Every value has a default that works on a developer machine, so a plain
/// `cargo run -p contract-harness --features tracking` needs no setup beyond
/// a reachable Docker daemon.
#[derive(Debug)]
pub struct ContractHarnessConfig {
    /// Docker daemon URL (`DOCKER_HOST`).
    /// default: `"unix:///var/run/docker.sock"`
    pub docker_host: String,

    /// Pixel id the in-process service reports under (`CAPI_PIXEL_ID`).
    /// Only the mock Conversions API ever sees it.
    /// default: `"contract-pixel"`
    pub capi_pixel_id: String,

    /// Access token handed to the mock Conversions API (`CAPI_ACCESS_TOKEN`).
    /// default: `"contract-token"`
    pub capi_access_token: String,

    /// Dedup row lifetime in hours (`DEDUP_TTL_HOURS`).
    /// default: `24`
    pub dedup_ttl_hours: i64,

    /// Successful inserts between expiry purges (`DEDUP_PURGE_EVERY`).
    /// default: `50`
    pub dedup_purge_every: u64,

    /// Attribution touch lifetime in seconds (`ATTRIBUTION_TTL_SECS`).
    /// default: `604800` (7 days)
    pub attribution_ttl_secs: u64,
}

impl ContractHarnessConfig {
    pub fn from_env() -> Self {
        Self {
            docker_host: std::env::var("DOCKER_HOST")
                .unwrap_or_else(|_| "unix:///var/run/docker.sock".to_owned()),
            capi_pixel_id: std::env::var("CAPI_PIXEL_ID")
                .unwrap_or_else(|_| "contract-pixel".to_owned()),
            capi_access_token: std::env::var("CAPI_ACCESS_TOKEN")
                .unwrap_or_else(|_| "contract-token".to_owned()),
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
