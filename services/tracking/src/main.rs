use std::sync::Arc;

use sea_orm::Database;
use tracing::info;

use rastro_tracking::config::TrackingConfig;
use rastro_tracking::dispatch::sanitizer::enrich_purchase_event_id;
use rastro_tracking::dispatch::{SanitizedSink, TrackingPixelSink};
use rastro_tracking::domain::types::PurgeCadence;
use rastro_tracking::infra::cache::RedisAttributionStore;
use rastro_tracking::infra::capi::HttpConversionsClient;
use rastro_tracking::infra::db::DbDedupRepository;
use rastro_tracking::router::build_router;
use rastro_tracking::state::AppState;

#[tokio::main]
async fn main() {
    rastro_core::tracing::init_tracing();

    let config = TrackingConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let redis_cfg = deadpool_redis::Config::from_url(&config.redis_url);
    let redis = redis_cfg
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .expect("failed to create Redis pool");

    let capi = HttpConversionsClient::new(
        &config.capi_base_url,
        &config.capi_pixel_id,
        &config.capi_access_token,
        config.capi_test_event_code.clone(),
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

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.tracking_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("tracking service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
