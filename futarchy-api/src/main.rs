//! Futarchy Chart API Server
//!
//! Serves proposal resolution, gap-filled pool candles and composite spot
//! prices from the configured subgraph backend and OHLCV provider.

mod error;
mod routes;

use axum::{
    http::{header, Method},
    Router,
};
use futarchy_services::{
    CacheWarmer, ChartCaches, ChartService, ServiceConfig, SpotService, WarmList,
};
use futarchy_spot::{GeckoTerminalClient, RateSource, RpcRateProvider, SpotEngine};
use futarchy_subgraph::{build_adapter, HttpGraphqlClient, MarketDataAdapter};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub chart_service: Arc<ChartService>,
    pub spot_service: Arc<SpotService>,
}

impl AppState {
    /// Wire the real upstream clients behind the services.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let adapter = build_adapter(config.adapter.clone(), Arc::new(HttpGraphqlClient::new()));
        Self::with_adapter(config, adapter)
    }

    /// Services over `adapter`, with rate and OHLCV clients from `config`.
    pub fn with_adapter(config: &ServiceConfig, adapter: Arc<dyn MarketDataAdapter>) -> Self {
        let rates: Arc<dyn RateSource> = Arc::new(RpcRateProvider::new());
        let ohlcv = Arc::new(GeckoTerminalClient::new(config.ohlcv_api_base.clone()));

        let caches = Arc::new(ChartCaches::new(&config.ttls));
        let warm_list = Arc::new(WarmList::new(
            config.warmer.capacity,
            config.warmer.retention,
        ));
        let spot_service = Arc::new(SpotService::new(
            SpotEngine::new(ohlcv, rates.clone()),
            caches.clone(),
        ));
        let chart_service = Arc::new(ChartService::new(
            adapter,
            rates,
            spot_service.clone(),
            caches,
            warm_list,
        ));

        Self {
            chart_service,
            spot_service,
        }
    }
}

/// Router with CORS for browser clients and request tracing
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .nest("/api", routes::api_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,futarchy_api=debug")),
        )
        .init();

    info!("Starting Futarchy Chart API");

    let config = ServiceConfig::from_env()?;
    info!(
        "Subgraph backend {} (registry {}, candles {})",
        config.adapter.backend, config.adapter.registry_endpoint, config.adapter.candles_endpoint
    );

    let state = AppState::from_config(&config);

    if config.warmer.enabled {
        let warmer = Arc::new(CacheWarmer::new(
            state.chart_service.clone(),
            config.ttls.response,
        ));
        tokio::spawn(async move {
            warmer.start().await;
        });
    } else {
        info!("Cache warmer disabled");
    }

    let port = std::env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use async_trait::async_trait;
    use axum::http::{Request, StatusCode};
    use futarchy_core::{Candle, ChartResult, Pool, ProposalIdentity};
    use futarchy_services::ChartParams;
    use futarchy_subgraph::Backend;
    use std::time::Duration;
    use tower::ServiceExt;

    /// No metadata anywhere; pool listing takes half a second
    struct SlowAdapter;

    #[async_trait]
    impl MarketDataAdapter for SlowAdapter {
        fn backend(&self) -> Backend {
            Backend::Checkpoint
        }

        async fn find_by_snapshot_id(&self, _identifier: &str) -> ChartResult<Option<ProposalIdentity>> {
            Ok(None)
        }

        async fn find_by_legacy_key(&self, _identifier: &str) -> ChartResult<Option<ProposalIdentity>> {
            Ok(None)
        }

        async fn list_pools(&self, _trading_address: &str, _chain_id: u64) -> ChartResult<Vec<Pool>> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(Vec::new())
        }

        async fn fetch_candle_series(
            &self,
            _pool_id: &str,
            _min_time: i64,
            _max_time: i64,
            _chain_id: u64,
        ) -> ChartResult<Vec<Candle>> {
            Ok(Vec::new())
        }
    }

    fn test_app() -> Router {
        app(AppState::from_config(&ServiceConfig::default()))
    }

    async fn get(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = test_app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null))
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["backend"], "graph-node");
        assert_eq!(body["warmList"], 0);
    }

    #[tokio::test]
    async fn test_spot_rejects_bad_ticker() {
        let (status, body) = get("/api/spot?ticker=PNK-hour-5-xdai").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Invalid ticker"));

        let (status, _) = get("/api/spot").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_chart_request_still_caches() {
        const TRADING: &str = "0x2222222222222222222222222222222222222222";
        let state = AppState::with_adapter(&ServiceConfig::default(), Arc::new(SlowAdapter));
        let request = Request::builder()
            .uri(format!("/api/chart/{}?minTime=1699999200&maxTime=1700006400", TRADING))
            .body(Body::empty())
            .unwrap();

        // Client gives up long before the pool listing returns
        let abandoned =
            tokio::time::timeout(Duration::from_millis(10), app(state.clone()).oneshot(request))
                .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_secs(1)).await;

        let key = ChartParams::new(TRADING)
            .with_window(Some(1_699_999_200), Some(1_700_006_400))
            .cache_key();
        let cached = state.chart_service.cached_response(&key).expect("cached response");
        assert_eq!(cached.proposal.trading_address, TRADING);
        assert!(!cached.degraded);
        assert!(state.chart_service.warm_list().contains(&key));

        let response = app(state.clone())
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["backend"], "checkpoint");
        assert_eq!(body["warmList"], 1);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, _) = get("/api/markets").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
