#![allow(dead_code)]

use std::sync::Arc;

use autobahn_api::auth::jwt::{Claims, JwtConfig};
use autobahn_api::config::{LogFormat, ServerConfig};
use autobahn_api::router::build_app_router;
use autobahn_api::state::AppState;
use autobahn_api::ws::WsManager;
use autobahn_events::{DispatchMessage, InProcessDispatchBus};
use autobahn_pipeline::memory::{InMemoryConnectionDirectory, InMemoryExecutionStore};
use autobahn_pipeline::{ExecutionOrchestrator, PgConnectionDirectory, PgExecutionStore};
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::broadcast;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";
pub const WORKER_TOKEN: &str = "worker-secret";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
        },
        dispatch_topic_url: None,
        worker_token: Some(WORKER_TOKEN.to_string()),
        log_format: LogFormat::Text,
    }
}

/// Build the full application router against a real database, wired the
/// same way `main.rs` wires it.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_config(pool, test_config())
}

pub fn build_test_app_with_config(pool: PgPool, config: ServerConfig) -> Router {
    let ws_manager = Arc::new(WsManager::new());
    let directory = Arc::new(PgConnectionDirectory::new(pool.clone()));
    let orchestrator = Arc::new(ExecutionOrchestrator::new(
        Arc::new(PgExecutionStore::new(pool.clone())),
        Arc::new(InProcessDispatchBus::default()),
        directory.clone(),
        ws_manager.clone(),
    ));

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager,
        orchestrator,
        directory,
    };
    build_app_router(state, &config)
}

/// An application backed by the in-memory store and directory.
///
/// The pool is lazy and never connects; only routes that go through the
/// orchestrator are usable.
pub struct MemoryApp {
    pub router: Router,
    pub store: Arc<InMemoryExecutionStore>,
    pub directory: Arc<InMemoryConnectionDirectory>,
    pub ws_manager: Arc<WsManager>,
    pub dispatched: broadcast::Receiver<(String, DispatchMessage)>,
}

impl MemoryApp {
    pub fn new() -> Self {
        let config = test_config();
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .expect("lazy pool should build");

        let store = Arc::new(InMemoryExecutionStore::new());
        let directory = Arc::new(InMemoryConnectionDirectory::new());
        let ws_manager = Arc::new(WsManager::new());
        let bus = Arc::new(InProcessDispatchBus::default());
        let dispatched = bus.subscribe();

        let orchestrator = Arc::new(ExecutionOrchestrator::new(
            store.clone(),
            bus,
            directory.clone(),
            ws_manager.clone(),
        ));

        let state = AppState {
            pool,
            config: Arc::new(config.clone()),
            ws_manager: ws_manager.clone(),
            orchestrator,
            directory: directory.clone(),
        };

        Self {
            router: build_app_router(state, &config),
            store,
            directory,
            ws_manager,
            dispatched,
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Drain every message published so far.
    pub fn drain_dispatched(&mut self) -> Vec<DispatchMessage> {
        let mut out = Vec::new();
        while let Ok((_, message)) = self.dispatched.try_recv() {
            out.push(message);
        }
        out
    }
}

/// Sign a one-hour identity token for `sub`.
pub fn token_for(sub: &str, username: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: sub.to_string(),
        username: Some(username.to_string()),
        exp: now + 3600,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("encoding should succeed")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::get(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::post(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST a JSON body with an optional `x-worker-token` header.
pub async fn post_json_worker(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    worker_token: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::post(uri).header("content-type", "application/json");
    if let Some(token) = worker_token {
        builder = builder.header("x-worker-token", token);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
