//! API routes for commandd
//!
//! Each handler opens its own unit of work from the shared store, stages at
//! most one mutation and commits it before responding.

use crate::error::ApiError;
use crate::extract::{JsonBody, ValidatedJson};
use crate::repo::CommandRepo;
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use command_common::{
    mapper, CommandCreateDto, CommandReadDto, CommandUpdateDto, PatchDocument,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use validator::Validate;

type AppStateArc = Arc<AppState>;

/// Resource root of the command API
pub const COMMANDS_ROOT: &str = "/api/commands";

// ============================================================================
// Command Routes
// ============================================================================

pub fn command_routes() -> Router<AppStateArc> {
    Router::new()
        .route(COMMANDS_ROOT, get(get_all_commands).post(create_command))
        .route(
            "/api/commands/:id",
            get(get_command_by_id)
                .put(update_command)
                .patch(partial_command_update)
                .delete(delete_command),
        )
}

/// Location of a single command
pub fn command_location(id: i64) -> String {
    format!("{}/{}", COMMANDS_ROOT, id)
}

async fn commit(repo: &mut dyn CommandRepo) -> Result<(), ApiError> {
    if repo.save_changes().await? {
        Ok(())
    } else {
        Err(ApiError::SaveFailed)
    }
}

async fn get_all_commands(
    State(state): State<AppStateArc>,
) -> Result<Json<Vec<CommandReadDto>>, ApiError> {
    let repo = state.store.begin();
    let commands = repo.get_all_commands().await?;
    debug!("  Listing {} command(s)", commands.len());

    Ok(Json(mapper::to_read_dtos(&commands)))
}

async fn get_command_by_id(
    State(state): State<AppStateArc>,
    Path(id): Path<i64>,
) -> Result<Json<CommandReadDto>, ApiError> {
    let repo = state.store.begin();
    let command = repo.get_command_by_id(id).await?.ok_or_else(|| {
        debug!("  Command not found: {}", id);
        ApiError::NotFound
    })?;

    Ok(Json(mapper::to_read_dto(&command)))
}

async fn create_command(
    State(state): State<AppStateArc>,
    ValidatedJson(dto): ValidatedJson<CommandCreateDto>,
) -> Result<impl IntoResponse, ApiError> {
    let mut repo = state.store.begin();
    let key = repo.create_command(mapper::from_create_dto(dto))?;
    commit(repo.as_mut()).await?;

    // A successful save always leaves the staged entry with its new id
    let created = repo.entry(key).cloned().ok_or(ApiError::SaveFailed)?;
    info!("  Created command {}", created.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, command_location(created.id))],
        Json(mapper::to_read_dto(&created)),
    ))
}

async fn update_command(
    State(state): State<AppStateArc>,
    Path(id): Path<i64>,
    ValidatedJson(dto): ValidatedJson<CommandUpdateDto>,
) -> Result<StatusCode, ApiError> {
    let mut repo = state.store.begin();
    let mut command = repo.get_command_by_id(id).await?.ok_or(ApiError::NotFound)?;

    mapper::apply_update_dto(dto, &mut command);
    repo.update_command(command)?;
    commit(repo.as_mut()).await?;
    info!("  Updated command {}", id);

    Ok(StatusCode::NO_CONTENT)
}

async fn partial_command_update(
    State(state): State<AppStateArc>,
    Path(id): Path<i64>,
    JsonBody(patch): JsonBody<PatchDocument>,
) -> Result<StatusCode, ApiError> {
    let mut repo = state.store.begin();
    let mut command = repo.get_command_by_id(id).await?.ok_or(ApiError::NotFound)?;

    let draft = patch
        .apply_to_shape(&mapper::to_update_dto(&command))
        .map_err(|e| {
            warn!("  Patch for command {} rejected: {}", id, e);
            ApiError::patch(&e)
        })?;
    draft
        .validate()
        .map_err(|e| ApiError::validation(StatusCode::UNPROCESSABLE_ENTITY, &e))?;

    mapper::apply_update_dto(draft, &mut command);
    repo.update_command(command)?;
    commit(repo.as_mut()).await?;
    info!(
        "  Patched command {} ({} operation(s))",
        id,
        patch.operations().len()
    );

    Ok(StatusCode::NO_CONTENT)
}

async fn delete_command(
    State(state): State<AppStateArc>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let mut repo = state.store.begin();
    let command = repo.get_command_by_id(id).await?.ok_or(ApiError::NotFound)?;

    repo.delete_command(command)?;
    commit(repo.as_mut()).await?;
    info!("  Deleted command {}", id);

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Health Routes
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub backend: String,
}

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> impl IntoResponse {
    let (code, status) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(e) => {
            warn!("  Store ping failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.start_time.elapsed().as_secs(),
            backend: state.store.backend().as_str().to_string(),
        }),
    )
}
