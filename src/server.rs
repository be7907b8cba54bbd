//! HTTP interaction surface.
//!
//! The presentation adapter (a chat-platform event receiver) calls these
//! routes: submit a form, then route button clicks to the matching
//! transition using the clicked message's id as the correlation key.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::announce;
use crate::error::{ErrorCode, LifecycleError};
use crate::service::RequestService;
use crate::types::{Request, Stats, Submission};

/// Shared state for the HTTP handlers.
#[derive(Clone)]
struct ApiServer {
    service: Arc<RequestService>,
}

/// Error body returned for failed operations.
#[derive(Serialize)]
struct ErrorBody {
    code: ErrorCode,
    message: String,
}

impl IntoResponse for LifecycleError {
    fn into_response(self) -> Response {
        let status = match self.code() {
            ErrorCode::MissingRequiredField | ErrorCode::InvalidFieldValue => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::RequestNotFound | ErrorCode::KeyNotFound => StatusCode::NOT_FOUND,
            ErrorCode::KeyAlreadyAttached | ErrorCode::KeyInUse | ErrorCode::InvalidTransition => {
                StatusCode::CONFLICT
            }
            ErrorCode::ChannelError => StatusCode::BAD_GATEWAY,
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn stats(State(state): State<ApiServer>) -> Result<Json<Stats>, LifecycleError> {
    Ok(Json(state.service.stats()?))
}

/// The intake form schema the presentation adapter renders as a modal.
async fn form() -> Json<serde_json::Value> {
    Json(announce::intake_form())
}

async fn lookup(
    State(state): State<ApiServer>,
    Path(key): Path<String>,
) -> Result<Json<Request>, LifecycleError> {
    Ok(Json(state.service.lookup(&key)?))
}

#[derive(Deserialize)]
struct SubmitPayload {
    user_id: String,
    channel_id: String,
    #[serde(flatten)]
    submission: Submission,
}

async fn submit(
    State(state): State<ApiServer>,
    Json(payload): Json<SubmitPayload>,
) -> Result<(StatusCode, Json<Request>), LifecycleError> {
    let request = state
        .service
        .submit(&payload.submission, &payload.user_id, &payload.channel_id)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[derive(Deserialize)]
struct ActionQuery {
    /// Identifier of the user who clicked the button.
    actor: Option<String>,
}

async fn resolve(
    State(state): State<ApiServer>,
    Path(key): Path<String>,
    Query(query): Query<ActionQuery>,
) -> Result<Json<Request>, LifecycleError> {
    Ok(Json(
        state.service.resolve(&key, query.actor.as_deref()).await?,
    ))
}

async fn discard(
    State(state): State<ApiServer>,
    Path(key): Path<String>,
    Query(query): Query<ActionQuery>,
) -> Result<Json<Request>, LifecycleError> {
    Ok(Json(
        state.service.discard(&key, query.actor.as_deref()).await?,
    ))
}

async fn reopen(
    State(state): State<ApiServer>,
    Path(key): Path<String>,
    Query(query): Query<ActionQuery>,
) -> Result<Json<Request>, LifecycleError> {
    Ok(Json(
        state.service.reopen(&key, query.actor.as_deref()).await?,
    ))
}

/// Build the router with all routes.
fn build_router(state: ApiServer) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/stats", get(stats))
        .route("/api/form", get(form))
        .route("/api/requests", post(submit))
        .route("/api/requests/{key}", get(lookup))
        .route("/api/requests/{key}/resolve", post(resolve))
        .route("/api/requests/{key}/discard", post(discard))
        .route("/api/requests/{key}/reopen", post(reopen))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind on localhost and serve until the process exits.
pub async fn serve(service: Arc<RequestService>, port: u16) -> anyhow::Result<()> {
    let app = build_router(ApiServer { service });

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "interaction surface listening on http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, app).await?;
    Ok(())
}
