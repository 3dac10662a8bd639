//! Admin HTTP API.
//!
//! Every request is stateless: fetch the full redirect set, analyze it,
//! then project or mutate through a fresh [`Desk`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version) |
//! | `GET`    | `/redirects` | Filtered, sorted table view |
//! | `POST`   | `/redirects` | Create a redirect |
//! | `GET`    | `/redirects/validate` | Validate a source path |
//! | `GET`    | `/redirects/{id}` | One analyzed redirect |
//! | `PUT`    | `/redirects/{id}` | Full update |
//! | `POST`   | `/redirects/{id}/status` | Enable or disable |
//! | `DELETE` | `/redirects/{id}` | Delete |
//! | `GET`    | `/content-types` | `all` plus every internal content type in use |
//!
//! `GET /redirects` accepts `filter` (`all|active|inactive|issues`),
//! `content_type`, `search`, `sort` (`created|source|destination|type|language`)
//! and `direction` (`asc|desc`).
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "validation_failed", "message": "...", "details": { ... } } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404),
//! `validation_failed` (422), `internal` (500).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use redirect_desk_core::actions::RemoteOutcome;
use redirect_desk_core::analyze::AnalysisSummary;
use redirect_desk_core::table::{SortDirection, SortField, StatusFilter};
use redirect_desk_core::{AnalyzedRedirect, RedirectDraft, RedirectError, RedirectStore, ValidationResult};

use crate::config::Config;
use crate::desk::{Desk, WriteReport};
use crate::list::sort_from_flags;
use crate::sqlite_store::SqliteStore;

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    store: Arc<dyn RedirectStore>,
}

impl AppState {
    async fn desk(&self) -> Result<Desk<dyn RedirectStore>, AppError> {
        Desk::load(self.store.clone(), self.config.resolver())
            .await
            .map_err(AppError::from)
    }
}

/// Starts the admin server against the configured SQLite database.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = SqliteStore::open(config).await?;
    run_server_with_store(config, Arc::new(store)).await
}

/// Starts the admin server over any [`RedirectStore`].
pub async fn run_server_with_store(
    config: &Config,
    store: Arc<dyn RedirectStore>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(Arc::new(config.clone()), store);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "admin server listening");
    println!("Redirect Desk admin API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn router(config: Arc<Config>, store: Arc<dyn RedirectStore>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/redirects", get(handle_list).post(handle_create))
        .route("/redirects/validate", get(handle_validate))
        .route(
            "/redirects/{id}",
            get(handle_get).put(handle_update).delete(handle_delete),
        )
        .route("/redirects/{id}/status", post(handle_status))
        .route("/content-types", get(handle_content_types))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { config, store })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<ValidationResult>,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<ValidationResult>,
}

impl AppError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError::new(StatusCode::BAD_REQUEST, "bad_request", message)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
                details: self.details,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Typed errors keep their meaning; anything else is a 500.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<RedirectError>() {
            Ok(RedirectError::Validation(result)) => {
                let message = result.errors.join("; ");
                AppError {
                    details: Some(result),
                    ..AppError::new(StatusCode::UNPROCESSABLE_ENTITY, "validation_failed", message)
                }
            }
            Ok(e @ RedirectError::NotFound(_)) | Ok(e @ RedirectError::ContentNotFound(_)) => {
                AppError::new(StatusCode::NOT_FOUND, "not_found", e.to_string())
            }
            Ok(e @ RedirectError::InvalidValue { .. }) => bad_request(e.to_string()),
            Ok(e @ RedirectError::Remote(_)) => {
                tracing::error!(error = %e, "request failed");
                AppError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", e.to_string())
            }
            Err(e) => {
                tracing::error!(error = %e, "request failed");
                AppError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", e.to_string())
            }
        }
    }
}

impl From<RedirectError> for AppError {
    fn from(err: RedirectError) -> Self {
        AppError::from(anyhow::Error::from(err))
    }
}

fn parse_param<T>(value: Option<&str>) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr<Err = RedirectError>,
{
    match value {
        None | Some("") => Ok(None),
        Some(v) => v.parse().map(Some).map_err(AppError::from),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /redirects ============

#[derive(Deserialize, Default)]
struct ListParams {
    filter: Option<String>,
    content_type: Option<String>,
    search: Option<String>,
    sort: Option<String>,
    direction: Option<String>,
}

#[derive(Serialize)]
struct ListResponse {
    redirects: Vec<AnalyzedRedirect>,
    total: usize,
    summary: AnalysisSummary,
}

async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, AppError> {
    let filter: Option<StatusFilter> = parse_param(params.filter.as_deref())?;
    let sort: Option<SortField> = parse_param(params.sort.as_deref())?;
    let direction: Option<SortDirection> = parse_param(params.direction.as_deref())?;

    let mut desk = state.desk().await?;
    let table = desk.table_mut();
    table.set_status_filter(filter.unwrap_or_default());
    if let Some(ct) = params.content_type.as_deref() {
        table.set_content_type(ct);
    }
    if let Some(search) = params.search {
        table.set_search(search);
    }
    table.set_sort(sort_from_flags(sort, direction));

    let table = desk.table();
    let redirects: Vec<AnalyzedRedirect> = table.view().into_iter().cloned().collect();
    Ok(Json(ListResponse {
        redirects,
        total: table.rows().len(),
        summary: table.summary(),
    }))
}

// ============ GET /redirects/{id} ============

async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AnalyzedRedirect>, AppError> {
    let desk = state.desk().await?;
    desk.table()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| RedirectError::NotFound(id).into())
}

// ============ POST /redirects ============

async fn handle_create(
    State(state): State<AppState>,
    Json(draft): Json<RedirectDraft>,
) -> Result<(StatusCode, Json<WriteReport>), AppError> {
    let mut desk = state.desk().await?;
    let report = desk.create(&draft).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

// ============ PUT /redirects/{id} ============

async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<RedirectDraft>,
) -> Result<Json<WriteReport>, AppError> {
    let mut desk = state.desk().await?;
    let report = desk.update(&id, &draft).await?;
    Ok(Json(report))
}

// ============ POST /redirects/{id}/status ============

#[derive(Deserialize)]
struct StatusBody {
    is_active: bool,
}

async fn handle_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Result<Json<RemoteOutcome>, AppError> {
    let mut desk = state.desk().await?;
    desk.set_status(&id, body.is_active).await?;
    Ok(Json(RemoteOutcome::ok()))
}

// ============ DELETE /redirects/{id} ============

async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RemoteOutcome>, AppError> {
    let mut desk = state.desk().await?;
    desk.delete(&id).await?;
    Ok(Json(RemoteOutcome::ok()))
}

// ============ GET /redirects/validate ============

#[derive(Deserialize)]
struct ValidateParams {
    #[serde(default)]
    source: String,
    current_id: Option<String>,
}

async fn handle_validate(
    State(state): State<AppState>,
    Query(params): Query<ValidateParams>,
) -> Result<Json<ValidationResult>, AppError> {
    let desk = state.desk().await?;
    let result = desk
        .validate_source(&params.source, params.current_id.as_deref())
        .await?;
    Ok(Json(result))
}

// ============ GET /content-types ============

#[derive(Serialize)]
struct ContentTypesResponse {
    content_types: Vec<String>,
}

async fn handle_content_types(
    State(state): State<AppState>,
) -> Result<Json<ContentTypesResponse>, AppError> {
    let desk = state.desk().await?;
    Ok(Json(ContentTypesResponse {
        content_types: desk.table().content_types(),
    }))
}
