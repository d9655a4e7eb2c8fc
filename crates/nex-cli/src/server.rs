//! HTTP surface: axum router, handlers, and the serve loop that owns the
//! store and its retention sweeper.

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use nex_core::{
    HopperRequest, IngestRequest, LoginRequest, NotifyRequest, OBFUSCATION_KEY_HEX, Tier,
    ValidationError,
};
use nex_store::{QueryConfig, TieredStore, decode_token, spawn_sweeper};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServeConfig;
use crate::error::ApiError;

pub struct AppState {
    pub store: Arc<TieredStore>,
    pub query: QueryConfig,
}

type SharedState = Arc<AppState>;
type ApiResult = std::result::Result<Json<Value>, ApiError>;

pub fn router(state: SharedState) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(cors::Any);

    Router::new()
        .route("/", get(health))
        .route("/notify", post(notify))
        .route("/hopper", post(hopper))
        .route("/login", post(login))
        .route("/entries/{tier}", get(list_entries))
        .route("/autojoin/{tier}", get(autojoin))
        .route("/servers/{tier}", get(servers))
        .route("/stats", get(stats))
        .route("/decode", post(decode))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

/// Bind, serve until SIGINT/SIGTERM, then stop the sweeper.
pub async fn serve(config: ServeConfig) -> Result<()> {
    let store = Arc::new(TieredStore::new(config.store.clone()));
    let cancel = CancellationToken::new();
    let shutdown = shutdown_signal()?;
    let sweeper = spawn_sweeper(Arc::clone(&store), config.sweeper.clone(), cancel.clone());

    let state = Arc::new(AppState {
        store,
        query: config.query.clone(),
    });
    let app = router(state);

    let address = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!(%address, "nexhub listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("server error")?;

    cancel.cancel();
    sweeper.await.context("sweeper task failed")?;
    info!("shutdown complete");
    Ok(())
}

/// Signal handlers are registered on the call, before the returned future
/// is first polled.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt =
        signal(SignalKind::interrupt()).context("failed to install SIGINT handler")?;
    let mut terminate =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;

    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => info!("received Ctrl+C, shutting down"),
            _ = terminate.recv() => info!("received terminate signal, shutting down"),
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::warn!("failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    })
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "handler panicked".to_string()
    };
    ApiError::Internal(detail).into_response()
}

// --- Request helpers ---

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> std::result::Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::MalformedPayload(e.to_string()))
}

fn parse_tier(raw: &str) -> std::result::Result<Tier, ApiError> {
    Ok(raw.parse::<Tier>()?)
}

fn parse_param(field: &'static str, raw: Option<&str>) -> std::result::Result<Option<u64>, ApiError> {
    raw.map(|s| {
        s.trim().parse::<u64>().map_err(|_| {
            ApiError::from(ValidationError::Malformed {
                field,
                reason: format!("`{s}` is not a non-negative integer"),
            })
        })
    })
    .transpose()
}

#[derive(Debug, Default, Deserialize)]
pub struct WindowParams {
    pub window: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DecodeRequest {
    token: Option<String>,
    key: Option<String>,
}

// --- Handlers ---

async fn health() -> Json<Value> {
    Json(json!({
        "message": "nexhub API online",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "ok",
        "endpoints": [
            "POST /notify",
            "POST /hopper",
            "POST /login",
            "GET /entries/{tier}",
            "GET /autojoin/{tier}",
            "GET /servers/{tier}",
            "GET /stats",
            "POST /decode",
        ],
    }))
}

async fn notify(State(state): State<SharedState>, body: Bytes) -> ApiResult {
    let req: NotifyRequest = parse_body(&body)?;
    ingest(&state, IngestRequest::Notify(req))
}

async fn hopper(State(state): State<SharedState>, body: Bytes) -> ApiResult {
    let req: HopperRequest = parse_body(&body)?;
    ingest(&state, IngestRequest::Hopper(req))
}

fn ingest(state: &AppState, req: IngestRequest) -> ApiResult {
    let entry = state.store.ingest(req.validate()?)?;
    Ok(Json(json!({
        "success": true,
        "message": format!("{} recorded in {}", entry.name, entry.tier),
        "tier": entry.tier,
        "id": entry.id,
    })))
}

async fn login(State(state): State<SharedState>, body: Bytes) -> ApiResult {
    let req: LoginRequest = parse_body(&body)?;
    let record = state.store.record_login(req.validate()?);
    Ok(Json(json!({
        "success": true,
        "message": format!("login recorded for {}", record.username),
    })))
}

async fn list_entries(State(state): State<SharedState>, Path(tier): Path<String>) -> ApiResult {
    let tier = parse_tier(&tier)?;
    let entries = state.store.list_tier(tier);
    Ok(Json(json!({
        "success": true,
        "tier": tier,
        "count": entries.len(),
        "entries": entries,
    })))
}

async fn autojoin(
    State(state): State<SharedState>,
    Path(tier): Path<String>,
    Query(params): Query<WindowParams>,
) -> ApiResult {
    let tier = parse_tier(&tier)?;
    let window_secs = parse_param("window", params.window.as_deref())?
        .unwrap_or(state.query.autojoin_window_secs);
    let entries = state
        .store
        .recent_for_autojoin(tier, Duration::from_secs(window_secs));
    Ok(Json(json!({
        "success": true,
        "tier": tier,
        "window": window_secs,
        "count": entries.len(),
        "entries": entries,
    })))
}

async fn servers(
    State(state): State<SharedState>,
    Path(tier): Path<String>,
    Query(params): Query<LimitParams>,
) -> ApiResult {
    let tier = parse_tier(&tier)?;
    let limit = parse_param("limit", params.limit.as_deref())?
        .map(|n| n as usize)
        .unwrap_or(state.query.servers_limit);
    let servers = state.store.unique_servers(tier, limit);
    Ok(Json(json!({
        "success": true,
        "tier": tier,
        "count": servers.len(),
        "servers": servers,
    })))
}

async fn stats(State(state): State<SharedState>) -> ApiResult {
    Ok(Json(serde_json::to_value(state.store.stats()).map_err(|e| {
        ApiError::Internal(format!("stats serialization failed: {e}"))
    })?))
}

async fn decode(body: Bytes) -> ApiResult {
    let req: DecodeRequest = parse_body(&body)?;
    let token = req
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or(ValidationError::MissingField("token"))?;
    let key = req.key.filter(|k| !k.trim().is_empty());
    let decoded = decode_token(token.trim(), key.as_deref().unwrap_or(OBFUSCATION_KEY_HEX))?;
    Ok(Json(json!({
        "success": true,
        "decoded": decoded,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use nex_core::transform;
    use nex_store::StoreConfig;

    fn state() -> SharedState {
        Arc::new(AppState {
            store: Arc::new(TieredStore::new(StoreConfig::default())),
            query: QueryConfig::default(),
        })
    }

    fn body(value: Value) -> Bytes {
        Bytes::from(value.to_string())
    }

    fn tier_path(name: &str) -> Path<String> {
        Path(name.to_string())
    }

    #[tokio::test]
    async fn test_notify_accepts_and_obfuscates() {
        let state = state();
        let Json(resp) = notify(
            State(Arc::clone(&state)),
            body(json!({
                "brainrotName": "Ferret",
                "valueNum": 15_000_000,
                "jobId": "job-7",
                "plotOwner": "alice",
            })),
        )
        .await
        .unwrap();
        assert_eq!(resp["success"], true);
        assert_eq!(resp["tier"], "HIGH");
        assert!(resp["id"].is_string());

        let Json(list) = list_entries(State(state), tier_path("HIGH")).await.unwrap();
        assert_eq!(list["count"], 1);
        let entry = &list["entries"][0];
        assert_eq!(entry["identifierForm"], "obfuscated");
        assert_ne!(entry["identifier"], "job-7");
        assert_eq!(entry["valuePerSecond"], "15.0M/s");
        assert_eq!(entry["owner"], "alice");
    }

    #[tokio::test]
    async fn test_notify_below_floor_rejected() {
        let state = state();
        let err = notify(
            State(Arc::clone(&state)),
            body(json!({"name": "Small", "magnitude": 499_999, "jobId": "j"})),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("below the minimum"));
        assert_eq!(state.store.stats().entries.total, 0);
    }

    #[tokio::test]
    async fn test_malformed_json_rejected() {
        let err = notify(State(state()), Bytes::from_static(b"{not json"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MalformedPayload(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_hopper_parses_generation() {
        let state = state();
        let Json(resp) = hopper(
            State(Arc::clone(&state)),
            body(json!({"name": "Otter", "jobId": "srv-1", "generation": "450M/s"})),
        )
        .await
        .unwrap();
        assert_eq!(resp["tier"], "TOP");

        let Json(list) = servers(State(state), tier_path("TOP"), Query(LimitParams::default()))
            .await
            .unwrap();
        assert_eq!(list["count"], 1);
        assert_eq!(list["servers"][0]["identifier"], "srv-1");
        assert_eq!(list["servers"][0]["origin"], "hopper");
    }

    #[tokio::test]
    async fn test_invalid_tier_rejected() {
        let err = list_entries(State(state()), tier_path("high")).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("invalid tier"));
    }

    #[tokio::test]
    async fn test_autojoin_window_param() {
        let state = state();
        notify(
            State(Arc::clone(&state)),
            body(json!({"name": "A", "magnitude": 1e6, "jobId": "j"})),
        )
        .await
        .unwrap();

        let Json(resp) = autojoin(
            State(Arc::clone(&state)),
            tier_path("NORMAL"),
            Query(WindowParams::default()),
        )
        .await
        .unwrap();
        assert_eq!(resp["window"], 600);
        assert_eq!(resp["count"], 1);

        let err = autojoin(
            State(state),
            tier_path("NORMAL"),
            Query(WindowParams {
                window: Some("soon".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_and_stats() {
        let state = state();
        let Json(resp) = login(
            State(Arc::clone(&state)),
            body(json!({"username": "bob", "userId": 42})),
        )
        .await
        .unwrap();
        assert_eq!(resp["success"], true);

        let err = login(State(Arc::clone(&state)), body(json!({"userId": 1})))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let Json(stats) = stats(State(state)).await.unwrap();
        assert_eq!(stats["users"]["totalLogins"], 1);
        assert_eq!(stats["users"]["recentLogins"][0]["username"], "bob");
    }

    #[tokio::test]
    async fn test_decode_round_trip() {
        let hidden = transform("job-99", OBFUSCATION_KEY_HEX).unwrap();
        let Json(resp) = decode(body(json!({"token": hidden}))).await.unwrap();
        assert_eq!(resp["decoded"], "job-99");

        let err = decode(body(json!({}))).await.unwrap_err();
        assert!(err.to_string().contains("token"));

        let err = decode(body(json!({"token": "zz"}))).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let Json(resp) = health().await;
        assert_eq!(resp["status"], "ok");
        assert!(resp["endpoints"].as_array().unwrap().len() >= 8);
    }

    #[test]
    fn test_panic_becomes_500() {
        let resp = handle_panic(Box::new("boom"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
