//! HTTP relay server
//!
//! Provides the signaling endpoints over a shared [`SessionStore`]:
//! - POST /signaling/:session_id - Write the sender's slot
//! - GET /signaling/:session_id?type=offer|answer - Read a slot
//! - DELETE /signaling/:session_id - Drop the session
//! - GET /health - Health check
//!
//! Every route allows cross-origin requests so browser peers served from
//! another origin can reach the relay.

use crate::config::RelayServerConfig;
use crate::error::{Error, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sigrelay_core::{FieldOutcome, SdpType, SessionStore, Slot};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Relay state shared across handlers
#[derive(Clone)]
struct RelayState {
    store: Arc<SessionStore>,
}

/// HTTP signaling relay
pub struct RelayServer {
    config: RelayServerConfig,
    store: Arc<SessionStore>,
}

impl RelayServer {
    /// Create a relay with an empty store
    pub fn new(config: RelayServerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_store(config, Arc::new(SessionStore::new())))
    }

    /// Create a relay over an existing store
    pub fn with_store(config: RelayServerConfig, store: Arc<SessionStore>) -> Self {
        Self { config, store }
    }

    pub fn store(&self) -> Arc<SessionStore> {
        Arc::clone(&self.store)
    }

    pub fn router(&self) -> Router {
        build_router(self.store())
    }

    /// Bind the configured address and serve until the process exits
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.socket_addr()?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::ServerError(format!("Failed to bind {}: {}", addr, e)))?;

        self.serve_listener(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve_listener<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener
            .local_addr()
            .map_err(|e| Error::ServerError(format!("Failed to get local addr: {}", e)))?;

        info!("Signaling relay listening on {}", local_addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| Error::ServerError(format!("Server error: {}", e)))?;

        info!("Signaling relay on {} stopped", local_addr);
        Ok(())
    }
}

/// Build the relay router over `store`
pub fn build_router(store: Arc<SessionStore>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/signaling/:session_id",
            post(upsert_handler)
                .get(get_slot_handler)
                .delete(delete_handler),
        )
        .with_state(RelayState { store })
        .layer(
            tower::ServiceBuilder::new()
                .layer(tower_http::trace::TraceLayer::new_for_http())
                .layer(tower_http::cors::CorsLayer::permissive()),
        )
}

/// Request body for POST /signaling/:session_id
#[derive(Debug, Deserialize)]
struct SignalRequest {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    sdp: Option<Value>,
    #[serde(default)]
    candidate: Option<Value>,
}

/// Query for GET /signaling/:session_id
#[derive(Debug, Deserialize)]
struct SlotQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// `{"status": ...}` acknowledgement
#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
}

/// Response body for GET /health
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    sessions: usize,
}

/// GET /health
async fn health_handler(State(state): State<RelayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sessions: state.store.len(),
    })
}

/// POST /signaling/:session_id - create or update the sender's slot
///
/// Always acknowledges with `{"status": "ok"}`; dedup and candidate policy
/// decisions are only logged.
async fn upsert_handler(
    State(state): State<RelayState>,
    Path(session_id): Path<String>,
    Json(request): Json<SignalRequest>,
) -> Json<StatusResponse> {
    let ack = Json(StatusResponse { status: "ok" });

    let kind = match request.kind.as_deref().map(str::parse::<SdpType>) {
        Some(Ok(kind)) => kind,
        _ => {
            debug!(
                session_id = %session_id,
                kind = ?request.kind,
                "Ignoring message without offer/answer type"
            );
            return ack;
        }
    };

    let outcome = state
        .store
        .upsert(&session_id, kind, request.sdp, request.candidate);

    if outcome.session_created {
        info!(
            session_id = %session_id,
            sessions = ?state.store.session_ids(),
            "Created signaling session"
        );
    }

    match outcome.sdp {
        FieldOutcome::Stored => info!(session_id = %session_id, %kind, "Stored session description"),
        FieldOutcome::Unchanged => debug!(session_id = %session_id, %kind, "Session description unchanged"),
        FieldOutcome::Absent | FieldOutcome::Rejected(_) => {}
    }

    match outcome.candidate {
        FieldOutcome::Stored => info!(session_id = %session_id, %kind, "Stored candidate"),
        FieldOutcome::Unchanged => debug!(session_id = %session_id, %kind, "Candidate unchanged"),
        FieldOutcome::Rejected(reason) => {
            warn!(session_id = %session_id, %kind, %reason, "Discarded candidate")
        }
        FieldOutcome::Absent => {}
    }

    ack
}

/// GET /signaling/:session_id?type=offer|answer - read one slot
async fn get_slot_handler(
    State(state): State<RelayState>,
    Path(session_id): Path<String>,
    Query(query): Query<SlotQuery>,
) -> std::result::Result<Json<Slot>, (StatusCode, &'static str)> {
    query
        .kind
        .as_deref()
        .and_then(|kind| kind.parse::<SdpType>().ok())
        .and_then(|kind| state.store.get(&session_id, kind))
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Not found"))
}

/// DELETE /signaling/:session_id - drop the session, idempotent
async fn delete_handler(
    State(state): State<RelayState>,
    Path(session_id): Path<String>,
) -> Json<StatusResponse> {
    let existed = state.store.delete(&session_id);

    info!(
        session_id = %session_id,
        existed,
        sessions = ?state.store.session_ids(),
        "Deleted signaling session"
    );

    Json(StatusResponse { status: "deleted" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use serde_json::json;
    use tower::ServiceExt;

    async fn call(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let router = build_router(Arc::new(SessionStore::new()));
        let (status, body) = call(&router, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok", "sessions": 0}));
    }

    #[tokio::test]
    async fn test_post_then_get() {
        let store = Arc::new(SessionStore::new());
        let router = build_router(Arc::clone(&store));

        let (status, body) = call(
            &router,
            post_json("/signaling/s1", json!({"type": "offer", "sdp": "X"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));

        let (status, body) = call(&router, get("/signaling/s1?type=offer")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"sdp": "X", "candidate": ""}));
        assert!(store.contains("s1"));
    }

    #[tokio::test]
    async fn test_get_missing_type_is_not_found() {
        let router = build_router(Arc::new(SessionStore::new()));
        call(&router, post_json("/signaling/s1", json!({"type": "offer", "sdp": "X"}))).await;

        let (status, _) = call(&router, get("/signaling/s1?type=answer")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&router, get("/signaling/s1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&router, get("/signaling/s1?type=bye")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bye_is_acknowledged_but_not_stored() {
        let store = Arc::new(SessionStore::new());
        let router = build_router(Arc::clone(&store));

        let (status, body) = call(&router, post_json("/signaling/s1", json!({"type": "bye"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_candidate_still_ok() {
        let store = Arc::new(SessionStore::new());
        let router = build_router(Arc::clone(&store));

        let (status, body) = call(
            &router,
            post_json(
                "/signaling/s1",
                json!({
                    "type": "offer",
                    "candidate": {
                        "candidate": "candidate:1 1 udp 2122260223 9f1e.local 5000 typ host",
                        "sdpMid": "0",
                        "sdpMLineIndex": 0
                    }
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
        assert_eq!(
            store.get("s1", SdpType::Offer).unwrap().candidate,
            json!("")
        );
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let router = build_router(Arc::new(SessionStore::new()));
        call(&router, post_json("/signaling/s1", json!({"type": "answer", "sdp": "Y"}))).await;

        for _ in 0..2 {
            let request = Request::builder()
                .method(Method::DELETE)
                .uri("/signaling/s1")
                .body(Body::empty())
                .unwrap();
            let (status, body) = call(&router, request).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({"status": "deleted"}));
        }

        let (status, _) = call(&router, get("/signaling/s1?type=answer")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_non_json_body_rejected() {
        let router = build_router(Arc::new(SessionStore::new()));
        let request = Request::builder()
            .method(Method::POST)
            .uri("/signaling/s1")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("not json"))
            .unwrap();
        let (status, _) = call(&router, request).await;
        assert!(status.is_client_error());
    }

    #[test]
    fn test_new_validates_config() {
        assert!(RelayServer::new(RelayServerConfig::new("nowhere")).is_err());
        assert!(RelayServer::new(RelayServerConfig::new("127.0.0.1:0")).is_ok());
    }
}
