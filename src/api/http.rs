use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, Json, Redirect},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::api::page;
use crate::blockchain::{PollHandle, PollStatus};
use crate::error::ApiError;
use crate::models::{TokenRecord, TransactionRecord};
use crate::report::DisplayFeed;

impl From<ApiError> for StatusCode {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Response structure for status endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub chain: String,
    pub listener: PollStatus,
    pub buffered_records: usize,
    pub detected_tokens: usize,
}

/// Response structure for records endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordsResponse {
    pub records: Vec<TransactionRecord>,
    pub count: usize,
    pub limit: usize,
}

/// Response structure for tokens endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct TokensResponse {
    pub tokens: Vec<TokenRecord>,
    pub count: usize,
}

/// Query parameters for records endpoint
#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

const MAX_LIMIT: usize = 1000;

/// Body of `POST /listener`
#[derive(Debug, Deserialize)]
pub struct ListenerToggle {
    pub enabled: bool,
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<DisplayFeed>,
    pub control: PollHandle,
    pub chain_name: String,
}

/// Build the display router; separate from `ApiServer` so tests can drive it directly
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_index))
        .route("/records", get(get_records))
        .route("/tokens", get(get_tokens))
        .route("/status", get(get_status))
        .route("/listener", post(set_listener))
        .route("/listener/toggle", post(toggle_listener))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}

/// Display HTTP server
pub struct ApiServer {
    state: AppState,
    pub host: String,
    pub port: u16,
}

impl ApiServer {
    pub fn new(state: AppState, host: String, port: u16) -> Self {
        Self { state, host, port }
    }

    /// Serve until `shutdown` resolves
    pub async fn start<F>(&self, shutdown: F) -> Result<(), ApiError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.state.clone());

        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ApiError::Server(format!("Failed to bind to {}: {}", addr, e)))?;

        log::info!("Display server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ApiError::Server(format!("Server error: {}", e)))?;

        Ok(())
    }
}

fn error_response(error: ApiError, code: &str) -> (StatusCode, Json<ErrorResponse>) {
    let message = error.to_string();
    (
        StatusCode::from(error),
        Json(ErrorResponse {
            error: code.to_string(),
            message,
        }),
    )
}

/// GET / - Listener page
pub async fn get_index(State(state): State<AppState>) -> Html<String> {
    let records = state.feed.recent_transactions(state.feed.capacity());
    let tokens = state.feed.tokens();
    let status = state.control.status();
    Html(page::render_index(&state.chain_name, &status, &records, &tokens))
}

/// GET /records - Recent transaction records, newest first
pub async fn get_records(
    Query(params): Query<RecordsQuery>,
    State(state): State<AppState>,
) -> ApiResult<Json<RecordsResponse>> {
    if params.limit == 0 {
        return Err(error_response(
            ApiError::InvalidParameter("Limit must be greater than 0".to_string()),
            "invalid_parameter",
        ));
    }

    if params.limit > MAX_LIMIT {
        return Err(error_response(
            ApiError::InvalidParameter(format!("Limit cannot exceed {}", MAX_LIMIT)),
            "invalid_parameter",
        ));
    }

    let records = state.feed.recent_transactions(params.limit);
    Ok(Json(RecordsResponse {
        count: records.len(),
        records,
        limit: params.limit,
    }))
}

/// GET /tokens - Detected tokens, newest first
pub async fn get_tokens(State(state): State<AppState>) -> Json<TokensResponse> {
    let tokens = state.feed.tokens();
    Json(TokensResponse {
        count: tokens.len(),
        tokens,
    })
}

/// GET /status - Poll loop status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(status_response(&state))
}

/// POST /listener - Switch polling on or off
pub async fn set_listener(
    State(state): State<AppState>,
    Json(body): Json<ListenerToggle>,
) -> Json<StatusResponse> {
    state.control.set_enabled(body.enabled);
    Json(status_response(&state))
}

/// POST /listener/toggle - Form toggle from the page
pub async fn toggle_listener(State(state): State<AppState>) -> Redirect {
    state.control.set_enabled(!state.control.is_enabled());
    Redirect::to("/")
}

fn status_response(state: &AppState) -> StatusResponse {
    let status = state.control.status();
    StatusResponse {
        status: if status.enabled { "running" } else { "paused" }.to_string(),
        chain: state.chain_name.clone(),
        listener: status,
        buffered_records: state.feed.transaction_count(),
        detected_tokens: state.feed.token_count(),
    }
}
