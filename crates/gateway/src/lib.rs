//! HTTP gateway for Umbra.
//!
//! Two routes: `GET /status` for liveness and `POST /chat` for turns. Each
//! chat session id maps to one `Session` behind a `tokio::sync::Mutex`, so
//! turns within a session run strictly one after another while different
//! sessions proceed independently.
//!
//! Built on Axum.

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::{Method, StatusCode, header},
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};
use umbra_agent::{Orchestrator, Session};
use umbra_core::error::DispatchError;

/// Sessions kept before the least recently used one is dropped.
pub const MAX_SESSIONS: usize = 1_000;

struct SessionSlot {
    session: Arc<Mutex<Session>>,
    last_used: Instant,
}

/// Shared application state for the gateway.
pub struct GatewayState {
    orchestrator: Arc<Orchestrator>,
    sessions: RwLock<HashMap<String, SessionSlot>>,
}

impl GatewayState {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// The session for `id`, created on first use. Without an id a fresh
    /// session is started and its generated id returned.
    async fn session(&self, id: Option<&str>) -> (String, Arc<Mutex<Session>>) {
        let mut sessions = self.sessions.write().await;

        if let Some(id) = id
            && let Some(slot) = sessions.get_mut(id)
        {
            slot.last_used = Instant::now();
            return (id.to_string(), slot.session.clone());
        }

        if sessions.len() >= MAX_SESSIONS {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                debug!(session = %key, "Evicting idle session");
                sessions.remove(&key);
            }
        }

        let session = self.orchestrator.session();
        let key = id.map(str::to_string).unwrap_or_else(|| session.id().to_string());
        let session = Arc::new(Mutex::new(session));
        sessions.insert(
            key.clone(),
            SessionSlot {
                session: session.clone(),
                last_used: Instant::now(),
            },
        );
        (key, session)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

type SharedState = Arc<GatewayState>;

/// Build the router with every gateway route.
///
/// Layers: CORS for browser front ends, a 1 MB body limit, HTTP tracing.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/status", get(status_handler))
        .route("/chat", post(chat_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: umbra_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let orchestrator = umbra_agent::bootstrap::build(&config).await?;
    let app = build_router(Arc::new(GatewayState::new(orchestrator)));

    info!(addr = %addr, "Gateway listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
}

async fn status_handler() -> Json<StatusResponse> {
    Json(StatusResponse { status: "ok" })
}

#[derive(Deserialize)]
struct ChatRequest {
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct ChatResponse {
    response: String,
    success: bool,
    session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<DispatchError>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    let prompt = payload
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No prompt provided",
            }),
        ))?;

    let session_id = payload
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    let (session_id, session) = state.session(session_id).await;
    info!(session = %session_id, prompt_len = prompt.len(), "Chat turn received");

    let result = session.lock().await.handle(prompt).await;

    Ok(Json(ChatResponse {
        response: result.reply().to_string(),
        success: result.success,
        session_id,
        error: result.error,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use umbra_core::error::ProviderError;
    use umbra_core::identity::StaticProfile;
    use umbra_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use umbra_core::tool::{Arity, FnTool, ToolRegistry};

    /// Answers every prompt with the same raw reply.
    struct FixedProvider(&'static str);

    #[async_trait]
    impl Provider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                content: self.0.into(),
                model: "fixed".into(),
            })
        }
    }

    fn state(reply: &'static str) -> SharedState {
        let mut builder = ToolRegistry::builder();
        builder
            .register_tool(FnTool::new("weather", Arity::Exact(1), "weather", |args| {
                Ok(Some(format!("Sunny in {}", args[0])))
            }))
            .unwrap();
        let orchestrator = Orchestrator::new(
            Arc::new(FixedProvider(reply)),
            "fixed",
            Arc::new(StaticProfile::new("You are Umbra.")),
            Arc::new(builder.build()),
        );
        Arc::new(GatewayState::new(Arc::new(orchestrator)))
    }

    fn chat(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn status_endpoint() {
        let app = build_router(state("hi"));
        let req = Request::builder().uri("/status").body(Body::empty()).unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await, serde_json::json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn chat_runs_a_tool() {
        let app = build_router(state(r#"{"tool":"weather","args":["Boston"]}"#));
        let response = app.oneshot(chat(r#"{"prompt":"weather in Boston"}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["response"], "Sunny in Boston");
        assert_eq!(body["success"], true);
        assert!(body.get("error").is_none());
        assert!(!body["session_id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_prompt_is_bad_request() {
        let app = build_router(state("hi"));
        for body in [r#"{"prompt":"   "}"#, r#"{}"#] {
            let response = app.clone().oneshot(chat(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(json(response).await["error"], "No prompt provided");
        }
    }

    #[tokio::test]
    async fn dispatch_failures_are_reported_not_raised() {
        let app = build_router(state(r#"{"tool":"weather","args":[]}"#));
        let response = app.oneshot(chat(r#"{"prompt":"weather"}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["kind"], "arity_mismatch");
        assert_eq!(body["error"]["expected"], 1);
        assert_eq!(body["error"]["received"], 0);
    }

    #[tokio::test]
    async fn session_id_keeps_history() {
        let state = state("Hello there");
        let app = build_router(state.clone());

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(chat(r#"{"prompt":"hi","session_id":"abc"}"#))
                .await
                .unwrap();
            assert_eq!(json(response).await["session_id"], "abc");
        }

        assert_eq!(state.session_count().await, 1);
        let (_, session) = state.session(Some("abc")).await;
        assert_eq!(session.lock().await.history().len(), 4);
    }

    #[tokio::test]
    async fn no_session_id_starts_fresh_sessions() {
        let state = state("Hello there");
        let app = build_router(state.clone());
        app.clone().oneshot(chat(r#"{"prompt":"hi"}"#)).await.unwrap();
        app.oneshot(chat(r#"{"prompt":"hi"}"#)).await.unwrap();
        assert_eq!(state.session_count().await, 2);
    }
}
