//! In-process boot of the tracking service for provisioned contract runs.
//!
//! Mirrors what `services/tracking/src/main.rs` does at startup, with two
//! differences: the listener takes a random OS-assigned port, and dispatches
//! go to a recording Conversions API double instead of the real ad platform.

use std::sync::Arc;

use anyhow::{Context, Result};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;

use rastro_testing::capi::MockCapiServer;
use rastro_tracking::dispatch::sanitizer::enrich_purchase_event_id;
use rastro_tracking::dispatch::{SanitizedSink, TrackingPixelSink};
use rastro_tracking::domain::types::PurgeCadence;
use rastro_tracking::infra::cache::RedisAttributionStore;
use rastro_tracking::infra::capi::HttpConversionsClient;
use rastro_tracking::infra::db::DbDedupRepository;
use rastro_tracking::router::build_router;
use rastro_tracking::state::AppState;
use rastro_tracking_migration::Migrator;

use crate::config::ContractHarnessConfig;
use crate::docker::InfraUrls;

/// Migrate the provisioned database, start the service, and return the base
/// URL fixtures should hit.
///
/// The service task and the mock Conversions API live until the harness
/// process exits; teardown of the containers is the caller's job.
pub async fn start_tracking(urls: &InfraUrls, config: &ContractHarnessConfig) -> Result<String> {
    let db = Database::connect(&urls.database_url)
        .await
        .context("failed to connect to the provisioned database")?;
    Migrator::up(&db, None)
        .await
        .context("failed to apply tracking migrations")?;

    let redis = deadpool_redis::Config::from_url(&urls.redis_url)
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .context("failed to create the provisioned Redis pool")?;

    let capi_double = MockCapiServer::start().await;
    let capi = HttpConversionsClient::new(
        &capi_double.base_url,
        &config.capi_pixel_id,
        &config.capi_access_token,
        None,
    );
    let cadence = PurgeCadence::new(config.dedup_purge_every);

    let pipeline = TrackingPixelSink {
        dedup: DbDedupRepository { db: db.clone() },
        conversions: capi.clone(),
        attribution: RedisAttributionStore {
            pool: redis.clone(),
            ttl_secs: config.attribution_ttl_secs,
        },
        cadence: cadence.clone(),
        dedup_ttl_hours: config.dedup_ttl_hours,
    };
    let mut sink = SanitizedSink::new(pipeline);
    sink.register(enrich_purchase_event_id);

    let state = AppState {
        db,
        redis,
        capi,
        sink: Arc::new(sink),
        cadence,
        dedup_ttl_hours: config.dedup_ttl_hours,
        attribution_ttl_secs: config.attribution_ttl_secs,
    };

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();

    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });

    Ok(format!("http://127.0.0.1:{port}"))
}
