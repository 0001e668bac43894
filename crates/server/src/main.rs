use std::time::Duration;

use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

const TOKEN_PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    server::config::load_feature_flags();
    let flags = server::config::feature_flags();

    server::telemetry::init_logging(flags.json_logs);
    if flags.telemetry {
        server::telemetry::init_telemetry();
    }
    server::health::record_start_time();

    let pool = server::db::create_pool()?;
    server::db::run_migrations(&pool).await?;

    let cleanup_pool = pool.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TOKEN_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match server::repo::refresh_token::purge_stale(&cleanup_pool).await {
                Ok(0) => {}
                Ok(purged) => tracing::info!(purged, "purged stale refresh tokens"),
                Err(e) => tracing::warn!(error = %e.message, "refresh token purge failed"),
            }
        }
    });

    let mut router = server::openapi::api_router(pool);

    if flags.telemetry {
        router = router.layer(server::telemetry::OtelTraceLayer);
    }

    let router = router
        .layer(axum::extract::DefaultBodyLimit::max(server::config::max_body_bytes()))
        .layer(axum::middleware::from_fn(server::auth::middleware::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let addr = server::config::bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "courtwise listening");
    axum::serve(listener, router).await?;
    Ok(())
}
