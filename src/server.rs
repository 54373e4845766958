use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::{
    api,
    coin_resolver::CoinResolver,
    config::Settings,
    http::HttpClientConfig,
    providers::{
        coingecko::CoinGeckoClient, dexscreener::DexScreenerClient, gemini::GeminiClient,
        moralis::MoralisClient, solana_rpc::SolanaRpcClient,
    },
    utils::now_ts,
};

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub moralis: MoralisClient,
    pub rpc: SolanaRpcClient,
    pub resolver: CoinResolver,
    pub gemini: GeminiClient,
}

impl AppState {
    /// Market-data lookups go through a retrying client; the keyed providers
    /// fail fast and surface the error.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let base = HttpClientConfig::from_settings(&settings);
        let market_http = base.clone().build().context("build market-data http client")?;
        let http = base
            .with_max_retries(0)
            .build()
            .context("build provider http client")?;

        let resolver = CoinResolver::new(
            CoinGeckoClient::new(market_http.clone(), settings.coingecko_base_url.clone()),
            DexScreenerClient::new(market_http, settings.dexscreener_base_url.clone()),
        );
        Ok(Self {
            moralis: MoralisClient::new(
                http.clone(),
                settings.moralis_base_url.clone(),
                settings.moralis_api_key.clone(),
            ),
            rpc: SolanaRpcClient::new(http.clone(), settings.solana_rpc_url.clone()),
            gemini: GeminiClient::new(
                http,
                settings.gemini_base_url.clone(),
                settings.gemini_model.clone(),
                settings.gemini_api_key.clone(),
            ),
            resolver,
            settings,
        })
    }
}

fn cors_layer(allow_origin: &str) -> CorsLayer {
    let origins = if allow_origin.trim() == "*" {
        AllowOrigin::from(Any)
    } else {
        let list: Vec<HeaderValue> = allow_origin
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| match HeaderValue::from_str(s) {
                Ok(v) => Some(v),
                Err(_) => {
                    log::warn!("server.cors.skip origin={}", s);
                    None
                }
            })
            .collect();
        AllowOrigin::list(list)
    };
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.cors_allow_origin);
    Router::new()
        .route("/api/health", get(api_health))
        .route("/api/rugpull", post(api::rugpull::rugpull))
        .route("/api/vault", post(api::vault::vault))
        .route("/api/chat", post(api::chat::chat))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(settings: Settings) -> Result<()> {
    let addr: SocketAddr = settings
        .bind_addr()
        .parse()
        .with_context(|| format!("server addr parse {}", settings.bind_addr()))?;

    if settings.moralis_api_key.is_none() {
        log::warn!("server.config MORALIS_API_KEY unset; /api/rugpull and /api/vault will fail");
    }
    if settings.gemini_api_key.is_none() {
        log::warn!("server.config GEMINI_API_KEY unset; /api/chat will fail");
    }

    let app = router(AppState::from_settings(settings)?);

    log::info!("server.start url=http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("server.stop");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("server.signal.error {}", e);
    }
}

async fn api_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "ok": true,
        "ts": now_ts(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
