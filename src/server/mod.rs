//! HTTP web boundary for the routing pipeline
//!
//! A thin request/response layer over the pipeline: one chat endpoint,
//! per-session history retrieval and clearing, aggregate statistics, and
//! health probes. Everything here is ordinary plumbing; the pipeline does
//! the work.

pub mod store;

pub use store::{ConversationEntry, ConversationStore, MemoryConversationStore};

use crate::error::{PipelineError, PipelineResult};
use crate::observability::metrics::metrics;
use crate::pipeline::Pipeline;
use crate::request_span;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, Instrument};
use uuid::Uuid;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

/// Chat server wiring the pipeline to HTTP routes
#[derive(Clone)]
pub struct ChatServer {
    pipeline: Arc<Pipeline>,
    store: Arc<dyn ConversationStore>,
}

impl ChatServer {
    pub fn new(pipeline: Arc<Pipeline>, store: Arc<dyn ConversationStore>) -> Self {
        Self { pipeline, store }
    }

    /// Bind and serve until the task is dropped
    pub async fn start(&self, bind: &str, port: u16) -> PipelineResult<()> {
        let addr: SocketAddr = format!("{bind}:{port}")
            .parse()
            .map_err(|e| PipelineError::server(format!("Invalid bind address: {e}")))?;

        info!("Starting chat server on {addr}");
        warp::serve(self.routes()).run(addr).await;
        Ok(())
    }

    /// The full route tree, exposed separately for in-process testing
    pub fn routes(&self) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
        let chat = warp::path!("api" / "chat")
            .and(warp::post())
            .and(warp::body::json())
            .and(with_server(self.clone()))
            .and_then(handle_chat);

        let history = warp::path!("api" / "history")
            .and(warp::get())
            .and(warp::query::<HistoryQuery>())
            .and(with_server(self.clone()))
            .and_then(handle_history);

        let clear = warp::path!("api" / "clear")
            .and(warp::post())
            .and(warp::body::json())
            .and(with_server(self.clone()))
            .and_then(handle_clear);

        let stats = warp::path!("api" / "stats")
            .and(warp::get())
            .and(with_server(self.clone()))
            .and_then(handle_stats);

        let health = warp::path!("health")
            .and(warp::get())
            .and(with_server(self.clone()))
            .and_then(handle_health);

        let live = warp::path!("live").and(warp::get()).and_then(handle_live);

        chat.or(history)
            .or(clear)
            .or(stats)
            .or(health)
            .or(live)
            .with(warp::cors().allow_any_origin())
            .recover(handle_rejection)
    }
}

fn with_server(
    server: ChatServer,
) -> impl Filter<Extract = (ChatServer,), Error = Infallible> + Clone {
    warp::any().map(move || server.clone())
}

/// Chat request body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    /// Reuses an existing session when present; otherwise one is created
    pub session_id: Option<String>,
}

/// Chat response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    pub route_history: Vec<String>,
    pub timestamp: String,
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct ClearRequest {
    session_id: String,
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    total_sessions: usize,
    total_messages: usize,
    requests_by_category: HashMap<String, u64>,
    available_stages: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct StatusMessage {
    message: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct LivenessResponse {
    alive: bool,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

async fn handle_chat(
    request: ChatRequest,
    server: ChatServer,
) -> Result<impl Reply, Infallible> {
    let message = request.message.trim().to_string();
    if message.is_empty() {
        return Ok(warp::reply::with_status(
            warp::reply::json(&ErrorResponse {
                error: "Empty message".to_string(),
            }),
            StatusCode::BAD_REQUEST,
        ));
    }

    let session_id = request
        .session_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = request_span!(session_id = %session_id);
    let record = server.pipeline.run(&message).instrument(span).await;

    let timestamp = record.formatted_timestamp();
    let response = ChatResponse {
        message: record
            .result
            .unwrap_or_else(|| "No response generated".to_string()),
        route_history: record.transitions,
        timestamp,
        session_id: session_id.clone(),
    };

    server
        .store
        .append(
            &session_id,
            ConversationEntry {
                user_input: message,
                agent_response: response.message.clone(),
                route_history: response.route_history.clone(),
                timestamp: Utc::now().to_rfc3339(),
            },
        )
        .await;

    Ok(warp::reply::with_status(
        warp::reply::json(&response),
        StatusCode::OK,
    ))
}

async fn handle_history(
    query: HistoryQuery,
    server: ChatServer,
) -> Result<impl Reply, Infallible> {
    let history = server.store.history(&query.session_id).await;
    Ok(warp::reply::json(&history))
}

async fn handle_clear(
    request: ClearRequest,
    server: ChatServer,
) -> Result<impl Reply, Infallible> {
    server.store.clear(&request.session_id).await;
    Ok(warp::reply::json(&StatusMessage {
        message: "History cleared".to_string(),
    }))
}

async fn handle_stats(server: ChatServer) -> Result<impl Reply, Infallible> {
    let snapshot = metrics().snapshot();
    let response = StatsResponse {
        total_sessions: server.store.session_count().await,
        total_messages: server.store.message_count().await,
        requests_by_category: snapshot.requests_by_category,
        available_stages: Pipeline::stage_names().to_vec(),
    };
    Ok(warp::reply::json(&response))
}

async fn handle_health(server: ChatServer) -> Result<impl Reply, Infallible> {
    match server.pipeline.service().health_check().await {
        Ok(()) => Ok(warp::reply::with_status(
            warp::reply::json(&HealthResponse { status: "healthy" }),
            StatusCode::OK,
        )),
        Err(error) => Ok(warp::reply::with_status(
            warp::reply::json(&ErrorResponse {
                error: format!("Backend unhealthy: {error}"),
            }),
            StatusCode::SERVICE_UNAVAILABLE,
        )),
    }
}

async fn handle_live() -> Result<impl Reply, Infallible> {
    Ok(warp::reply::json(&LivenessResponse { alive: true }))
}

/// Convert any rejection into a JSON failure response
async fn handle_rejection(rejection: Rejection) -> Result<impl Reply, Infallible> {
    let (status, error) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if let Some(e) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid request body: {e}"))
    } else if rejection.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, "Invalid query string".to_string())
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Unhandled server error".to_string(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorResponse { error }),
        status,
    ))
}
