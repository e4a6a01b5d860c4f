//! HTTP routes.

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use taleweaver_domain::{Adventure, AdventureId, HistoryEntry, HistoryEntryId, UserId};
use taleweaver_shared::{
    CreateHeroRequest, CreateHeroResponse, ErrorResponse, HeroPromptRequest, HeroPromptResponse,
    HistoryEntryDto, ImportTemplateResponse, RollbackResponse, RunSummaryDto, StartRunResponse,
    TemplateExport, TemplateSummaryDto,
};

use crate::app::App;
use crate::use_cases::narrative::NarrativeError;
use crate::use_cases::runs::RunError;

/// Header carrying the calling player's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/templates", get(list_templates))
        .route("/api/templates/import", post(import_template))
        .route("/api/templates/{id}/export", get(export_template))
        .route("/api/templates/{id}/start", post(start_run))
        .route("/api/runs", get(list_runs))
        .route("/api/runs/{id}", get(get_run).delete(delete_run))
        .route("/api/runs/{id}/hero", post(create_hero))
        .route("/api/runs/{id}/history", get(list_history))
        .route("/api/runs/{id}/history/generate", post(generate_turn))
        .route("/api/runs/{id}/history/hero-prompt", post(hero_prompt))
        .route("/api/runs/{id}/history/regenerate", post(regenerate_last))
        .route(
            "/api/runs/{id}/history/{entry_id}/rollback",
            post(rollback_to),
        )
}

async fn health() -> &'static str {
    "OK"
}

// =============================================================================
// Caller identity
// =============================================================================

/// The player making the request, taken from the `X-User-Id` header.
#[derive(Debug, Clone, Copy)]
pub struct Player(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for Player {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("X-User-Id header is required".into()))?;
        let uuid = value
            .to_str()
            .ok()
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .ok_or_else(|| ApiError::Unauthorized("X-User-Id must be a UUID".into()))?;
        Ok(Self(UserId::from_uuid(uuid)))
    }
}

async fn owned_run(app: &App, run: i64, player: UserId) -> Result<Adventure, ApiError> {
    Ok(app
        .use_cases
        .runs
        .manage
        .get_run(AdventureId::new(run), player)
        .await?)
}

// =============================================================================
// Templates
// =============================================================================

async fn list_templates(
    State(app): State<Arc<App>>,
) -> Result<Json<Vec<TemplateSummaryDto>>, ApiError> {
    let templates = app.use_cases.transfer.list_templates().await?;
    Ok(Json(templates.iter().map(template_summary).collect()))
}

async fn import_template(
    State(app): State<Arc<App>>,
    Player(author): Player,
    Json(document): Json<TemplateExport>,
) -> Result<(StatusCode, Json<ImportTemplateResponse>), ApiError> {
    let id = app
        .use_cases
        .transfer
        .import_template(&document, author)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ImportTemplateResponse {
            template_id: id.get(),
        }),
    ))
}

async fn export_template(
    State(app): State<Arc<App>>,
    Path(id): Path<i64>,
) -> Result<Json<TemplateExport>, ApiError> {
    let document = app
        .use_cases
        .transfer
        .export_template(AdventureId::new(id))
        .await?;
    Ok(Json(document))
}

async fn start_run(
    State(app): State<Arc<App>>,
    Player(player): Player,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<StartRunResponse>), ApiError> {
    let run = app
        .use_cases
        .runs
        .start_run
        .execute(AdventureId::new(id), player)
        .await?;
    Ok((StatusCode::CREATED, Json(StartRunResponse { run_id: run.get() })))
}

// =============================================================================
// Runs
// =============================================================================

async fn list_runs(
    State(app): State<Arc<App>>,
    Player(player): Player,
) -> Result<Json<Vec<RunSummaryDto>>, ApiError> {
    let runs = app.use_cases.runs.manage.list_runs(player).await?;
    Ok(Json(runs.iter().map(run_summary).collect()))
}

async fn get_run(
    State(app): State<Arc<App>>,
    Player(player): Player,
    Path(id): Path<i64>,
) -> Result<Json<RunSummaryDto>, ApiError> {
    let run = owned_run(&app, id, player).await?;
    Ok(Json(run_summary(&run)))
}

async fn delete_run(
    State(app): State<Arc<App>>,
    Player(player): Player,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    app.use_cases
        .runs
        .manage
        .delete_run(AdventureId::new(id), player)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_hero(
    State(app): State<Arc<App>>,
    Player(player): Player,
    Path(id): Path<i64>,
    Json(request): Json<CreateHeroRequest>,
) -> Result<(StatusCode, Json<CreateHeroResponse>), ApiError> {
    let run = owned_run(&app, id, player).await?;
    let hero = app
        .use_cases
        .runs
        .create_hero
        .execute(run.id, &request)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateHeroResponse { hero_id: hero.get() }),
    ))
}

// =============================================================================
// History
// =============================================================================

async fn list_history(
    State(app): State<Arc<App>>,
    Player(player): Player,
    Path(id): Path<i64>,
) -> Result<Json<Vec<HistoryEntryDto>>, ApiError> {
    let run = owned_run(&app, id, player).await?;
    let entries = app.use_cases.narrative.list_history.execute(run.id).await?;
    Ok(Json(entries.iter().map(history_entry).collect()))
}

async fn generate_turn(
    State(app): State<Arc<App>>,
    Player(player): Player,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<HistoryEntryDto>), ApiError> {
    let run = owned_run(&app, id, player).await?;
    let entry = app.use_cases.narrative.generate_turn.execute(run.id).await?;
    Ok((StatusCode::CREATED, Json(history_entry(&entry))))
}

async fn hero_prompt(
    State(app): State<Arc<App>>,
    Player(player): Player,
    Path(id): Path<i64>,
    Json(request): Json<HeroPromptRequest>,
) -> Result<(StatusCode, Json<HeroPromptResponse>), ApiError> {
    let run = owned_run(&app, id, player).await?;
    let content = request.content.unwrap_or_default();
    let result = app
        .use_cases
        .narrative
        .submit_hero_action
        .execute(run.id, &content)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(HeroPromptResponse {
            user_entry: history_entry(&result.user_entry),
            ai_entry: history_entry(&result.ai_entry),
        }),
    ))
}

async fn rollback_to(
    State(app): State<Arc<App>>,
    Player(player): Player,
    Path((id, entry_id)): Path<(i64, i64)>,
) -> Result<Json<RollbackResponse>, ApiError> {
    let run = owned_run(&app, id, player).await?;
    let deleted = app
        .use_cases
        .narrative
        .rollback_to
        .execute(run.id, HistoryEntryId::new(entry_id))
        .await?;
    Ok(Json(RollbackResponse { deleted }))
}

async fn regenerate_last(
    State(app): State<Arc<App>>,
    Player(player): Player,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<HistoryEntryDto>), ApiError> {
    let run = owned_run(&app, id, player).await?;
    let entry = app
        .use_cases
        .narrative
        .regenerate_last
        .execute(run.id)
        .await?;
    Ok((StatusCode::CREATED, Json(history_entry(&entry))))
}

// =============================================================================
// Wire conversions
// =============================================================================

fn history_entry(entry: &HistoryEntry) -> HistoryEntryDto {
    HistoryEntryDto {
        id: entry.id.get(),
        role: entry.role.as_str().to_string(),
        content: entry.content.clone(),
        metadata: entry.metadata.clone(),
        created_at: entry.created_at.to_rfc3339(),
    }
}

fn run_summary(run: &Adventure) -> RunSummaryDto {
    RunSummaryDto {
        id: run.id.get(),
        template_id: run.template_id.map(AdventureId::get),
        title: run.title.clone(),
        description: run.description.clone(),
        primary_hero_id: run.primary_hero_id.map(|id| id.get()),
        is_waiting_ai: run.is_waiting_ai,
        rollback_min_history_id: run.rollback_min_history_id.map(HistoryEntryId::get),
        created_at: run.created_at.to_rfc3339(),
    }
}

fn template_summary(template: &Adventure) -> TemplateSummaryDto {
    TemplateSummaryDto {
        id: template.id.get(),
        author: template.author.to_string(),
        title: template.title.clone(),
        description: template.description.clone(),
        created_at: template.created_at.to_rfc3339(),
    }
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Unauthorized(String),
    BadGateway(String),
    Internal(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

impl From<NarrativeError> for ApiError {
    fn from(e: NarrativeError) -> Self {
        match e {
            NarrativeError::Conflict => ApiError::Conflict(e.to_string()),
            NarrativeError::Validation(msg) => ApiError::BadRequest(msg),
            NarrativeError::EmptyModelResponse => ApiError::BadRequest(e.to_string()),
            NarrativeError::Upstream(_) => ApiError::BadGateway(e.to_string()),
            NarrativeError::NotFound(msg) => ApiError::NotFound(msg),
            NarrativeError::Repo(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<RunError> for ApiError {
    fn from(e: RunError) -> Self {
        match e {
            RunError::Validation(msg) => ApiError::BadRequest(msg),
            RunError::NotFound(msg) => ApiError::NotFound(msg),
            RunError::Repo(_) => ApiError::Internal(e.to_string()),
        }
    }
}
