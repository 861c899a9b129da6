// handlers/mod.rs - router and shared state
//
// Public:    GET /, GET /health, GET /{PING}
// Protected: GET|POST /api/:account (bearer token verified by jwt_auth_middleware)

pub mod account;

pub use account::{account_get, account_post};

use axum::{
    extract::{ConnectInfo, DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{AccessGuard, KeyError, TokenVerifier};
use crate::config::{AppConfig, SecurityConfig};
use crate::database::LedgerStore;
use crate::ledger::{LedgerReader, LedgerWriter, RowDecodePolicy};
use crate::middleware::jwt_auth_middleware;

/// Everything a request needs, built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<TokenVerifier>,
    pub guard: AccessGuard,
    pub reader: LedgerReader,
    pub writer: LedgerWriter,
    pub store: Arc<dyn LedgerStore>,
}

impl AppState {
    pub fn new(config: &AppConfig, store: Arc<dyn LedgerStore>) -> Result<Self, KeyError> {
        let verifier = TokenVerifier::from_config(&config.auth)?;
        let policy = RowDecodePolicy::from_skip_flag(config.ledger.skip_undecodable_rows);

        Ok(Self {
            verifier: Arc::new(verifier),
            guard: AccessGuard::new(config.auth.enforce_account_binding),
            reader: LedgerReader::new(store.clone(), policy),
            writer: LedgerWriter::new(store.clone()),
            store,
        })
    }
}

pub fn app(state: AppState, config: &AppConfig) -> Router {
    let api = Router::new()
        .route("/api/:account", get(account_get).post(account_post))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware));

    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(api);

    if let Some(ping_path) = &config.server.ping_path {
        router = router.route(&format!("/{}", ping_path), get(ping));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.security))
                .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes)),
        )
        .with_state(state)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    // A wildcard cannot be listed or combined with credentials
    if security.cors_origins.iter().any(|origin| origin.trim() == "*") {
        tracing::warn!("CORS allows any origin; credentials are disabled");
        return base.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins)).allow_credentials(true)
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "account": "GET /api/:account?p=:page (bearer token)",
            "post": "POST /api/:account {amount, desc} (bearer token, parent role)",
            "health": "GET /health",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "timestamp": now, "database": "ok" })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "timestamp": now, "database": "unavailable" })),
            )
        }
    }
}

async fn ping(remote: Option<ConnectInfo<SocketAddr>>) -> StatusCode {
    match remote {
        Some(ConnectInfo(addr)) => tracing::info!("PING from {}", addr),
        None => tracing::info!("PING"),
    }
    StatusCode::OK
}
