// Lease Ledger - Web Server
// JSON API over the lease store

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use lease_ledger::{
    init_logging, open_store, Config, Lease, LeaseBackend, LeaseDraft, LeaseError, LeasePatch,
    LeaseStore, PortfolioSummary,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
struct AppState<B: LeaseBackend> {
    store: Arc<Mutex<LeaseStore<B>>>,
}

impl<B: LeaseBackend> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<B: LeaseBackend> AppState<B> {
    fn store(&self) -> Result<MutexGuard<'_, LeaseStore<B>>, ApiError> {
        self.store
            .lock()
            .map_err(|_| ApiError::Internal("lease store lock poisoned".to_string()))
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CostResponse {
    id: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    total_cost: Decimal,
}

#[derive(Serialize)]
struct RemoveResponse {
    removed: bool,
}

// ============================================================================
// Errors → HTTP
// ============================================================================

enum ApiError {
    Lease(LeaseError),
    BadJson(String),
    Internal(String),
}

impl From<LeaseError> for ApiError {
    fn from(e: LeaseError) -> Self {
        ApiError::Lease(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::BadJson(e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Lease(e @ LeaseError::Validation(_)) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Lease(e @ LeaseError::NotFound(_)) => (StatusCode::NOT_FOUND, e.to_string()),
            ApiError::Lease(e) => {
                tracing::error!(error = %e, "lease store failure");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ApiError::BadJson(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    ApiResponse::ok("OK")
}

/// GET /api/leases - All leases in insertion order
async fn list_leases<B: LeaseBackend>(State(state): State<AppState<B>>) -> ApiResult<Vec<Lease>> {
    let store = state.store()?;
    Ok(ApiResponse::ok(store.list().to_vec()))
}

/// POST /api/leases - Add a lease
async fn add_lease<B: LeaseBackend>(
    State(state): State<AppState<B>>,
    payload: Result<Json<LeaseDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Lease>>), ApiError> {
    let Json(draft) = payload?;
    let lease = state.store()?.add(draft)?;
    Ok((StatusCode::CREATED, ApiResponse::ok(lease)))
}

/// GET /api/leases/:id - One lease
async fn get_lease<B: LeaseBackend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> ApiResult<Lease> {
    let lease = state.store()?.get(&id)?;
    Ok(ApiResponse::ok(lease))
}

/// PATCH /api/leases/:id - Partial update
async fn update_lease<B: LeaseBackend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
    payload: Result<Json<LeasePatch>, JsonRejection>,
) -> ApiResult<Lease> {
    let Json(patch) = payload?;
    let lease = state.store()?.update(&id, &patch)?;
    Ok(ApiResponse::ok(lease))
}

/// DELETE /api/leases/:id - Remove (absent id is not an error)
async fn remove_lease<B: LeaseBackend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> ApiResult<RemoveResponse> {
    let removed = state.store()?.remove(&id)?;
    Ok(ApiResponse::ok(RemoveResponse { removed }))
}

/// POST /api/leases/:id/calculate - Store and return monthly payment × term
async fn calculate_cost<B: LeaseBackend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> ApiResult<CostResponse> {
    let total_cost = state.store()?.calculate_cost(&id)?;
    Ok(ApiResponse::ok(CostResponse { id, total_cost }))
}

/// GET /api/summary - Dashboard numbers
async fn summary<B: LeaseBackend>(State(state): State<AppState<B>>) -> ApiResult<PortfolioSummary> {
    let summary = state.store()?.summary()?;
    Ok(ApiResponse::ok(summary))
}

/// Build the router around any backend
fn app<B>(store: LeaseStore<B>) -> Router
where
    B: LeaseBackend + Send + 'static,
{
    let state = AppState {
        store: Arc::new(Mutex::new(store)),
    };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/leases", get(list_leases::<B>).post(add_lease::<B>))
        .route(
            "/leases/:id",
            get(get_lease::<B>)
                .patch(update_lease::<B>)
                .delete(remove_lease::<B>),
        )
        .route("/leases/:id/calculate", post(calculate_cost::<B>))
        .route("/summary", get(summary::<B>))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use anyhow::Context;

    let config = Config::resolve(None).context("Failed to load configuration")?;
    init_logging(&config.logging.level);

    let store = open_store(&config.storage)
        .with_context(|| format!("Failed to open lease store at {:?}", config.storage.db_path))?;
    tracing::info!(path = ?config.storage.db_path, leases = store.len(), "lease store ready");

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("🚀 Lease Ledger API on http://{}/api/leases", addr);

    axum::serve(listener, app(store))
        .await
        .context("Server stopped unexpectedly")?;

    Ok(())
}
