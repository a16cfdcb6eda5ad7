//! roleperm REST API server
//!
//! Run with: cargo run --features server --bin roleperm-server -- --db-path ./data/roleperm.mdb
//!
//! Endpoints:
//!   GET    /health                  - Health check
//!   GET    /catalog                 - Active permission catalog
//!   GET    /roles                   - List roles
//!   POST   /roles                   - Create role
//!   GET    /roles/:id               - Role with normalized permissions
//!   PATCH  /roles/:id               - Rename role
//!   DELETE /roles/:id               - Delete role
//!   GET    /roles/:id/tree          - Editor tree for a role
//!   PUT    /roles/:id/permissions   - Replace a role's permissions

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use roleperm::config::ServerConfig;
use roleperm::{
    flatten, hydrate_with_report, Catalog, GrantEntry, LmdbStore, ModuleNode, PermError, Session, StaleGrant,
};

// ============================================================================
// State
// ============================================================================

#[derive(Clone)]
struct AppState {
    catalog: Arc<Catalog>,
    store: Arc<LmdbStore>,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct RoleNameRequest {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PermissionsRequest {
    #[serde(default)]
    permissions: Vec<GrantEntry>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    catalog_version: String,
}

#[derive(Debug, Serialize)]
struct RoleSummary {
    id: u64,
    name: String,
    modules: usize,
}

#[derive(Debug, Serialize)]
struct RoleResponse {
    id: u64,
    name: String,
    permissions: Vec<GrantEntry>,
    /// Stored grants the current catalog does not recognise
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stale: Vec<StaleGrant>,
}

#[derive(Debug, Serialize)]
struct SaveResponse {
    permissions: Vec<GrantEntry>,
    dropped: Vec<StaleGrant>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

struct ApiError(PermError);

impl From<PermError> for ApiError {
    fn from(e: PermError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.root() {
            PermError::RoleNotFound(_) => StatusCode::NOT_FOUND,
            PermError::DuplicateRole(_) => StatusCode::CONFLICT,
            PermError::UnknownModule(_)
            | PermError::UnknownLeaf { .. }
            | PermError::UnknownSubModule { .. }
            | PermError::WrongShape { .. }
            | PermError::InvalidRoleName(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        (status, Json(ErrorResponse { error: self.0.to_string() })).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ============================================================================
// Handlers
// ============================================================================

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        catalog_version: state.catalog.version.clone(),
    })
}

async fn get_catalog(State(state): State<AppState>) -> Json<Catalog> {
    Json(state.catalog.as_ref().clone())
}

async fn list_roles(State(state): State<AppState>) -> ApiResult<Vec<RoleSummary>> {
    let roles = state.store.list_roles()?;
    Ok(Json(
        roles
            .into_iter()
            .map(|r| RoleSummary { id: r.id, name: r.name, modules: r.permissions.len() })
            .collect(),
    ))
}

async fn create_role(
    State(state): State<AppState>,
    Json(req): Json<RoleNameRequest>,
) -> Result<(StatusCode, Json<RoleSummary>), ApiError> {
    let id = state.store.create_role(&req.name)?;
    Ok((StatusCode::CREATED, Json(RoleSummary { id, name: req.name, modules: 0 })))
}

async fn get_role(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<RoleResponse> {
    let record = state
        .store
        .role(id)?
        .ok_or_else(|| PermError::RoleNotFound(id.to_string()))?;
    let (perms, stale) = hydrate_with_report(&state.catalog, &record.permissions);
    Ok(Json(RoleResponse {
        id,
        name: record.name,
        permissions: flatten(&state.catalog, &perms),
        stale,
    }))
}

async fn rename_role(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<RoleNameRequest>,
) -> Result<StatusCode, ApiError> {
    state.store.rename_role(id, &req.name)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_role(State(state): State<AppState>, Path(id): Path<u64>) -> Result<StatusCode, ApiError> {
    if state.store.delete_role(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(PermError::RoleNotFound(id.to_string()).into())
    }
}

async fn get_tree(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<Vec<ModuleNode>> {
    let session = Session::open(&state.catalog, state.store.as_ref(), id)?;
    Ok(Json(session.tree()))
}

async fn put_permissions(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<PermissionsRequest>,
) -> ApiResult<SaveResponse> {
    let mut session = Session::open(&state.catalog, state.store.as_ref(), id)?;
    let dropped = session.replace(&req.permissions)?;
    let permissions = session.save()?;
    Ok(Json(SaveResponse { permissions, dropped }))
}

// ============================================================================
// Main
// ============================================================================

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/catalog", get(get_catalog))
        .route("/roles", get(list_roles).post(create_role))
        .route("/roles/:id", get(get_role).patch(rename_role).delete(delete_role))
        .route("/roles/:id/tree", get(get_tree))
        .route("/roles/:id/permissions", put(put_permissions))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("roleperm=info,tower_http=info")),
        )
        .init();

    let config = ServerConfig::parse();

    let catalog = match config.catalog() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to load catalog");
            std::process::exit(1);
        }
    };
    let store = match config.open_store() {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, path = %config.db_path.display(), "failed to open grant store");
            std::process::exit(1);
        }
    };
    if let Err(e) = store.sync_catalog_version(&catalog) {
        error!(error = %e, "failed to record catalog version");
        std::process::exit(1);
    }
    info!(
        version = %catalog.version,
        modules = catalog.modules().len(),
        leaves = catalog.leaf_count(),
        "catalog loaded"
    );

    let app = router(AppState { catalog: Arc::new(catalog), store: Arc::new(store) });

    let addr = config.addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(error = %e, %addr, "failed to bind");
            std::process::exit(1);
        }
    };
    info!("roleperm-server v{} listening on {}", env!("CARGO_PKG_VERSION"), addr);
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server error");
    }
}
