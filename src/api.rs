//! Thin HTTP surface over the fusion store: read accessors, the admin sync
//! trigger and curation actions.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::ingest::SyncOrchestrator;
use crate::model::*;
use crate::store::curation::{
    BriefingDraft, CurationError, MediaFeedDraft, NewsDraft, NewsPatch, ProjectDraft, ProjectPatch,
};
use crate::store::views::{NewsFilter, OverviewFilter, ProjectFilter};
use crate::store::FusionStore;

pub const ADMIN_HEADER: &str = "x-admin-token";

#[derive(Clone)]
pub struct AppState {
    pub store: FusionStore,
    pub orchestrator: SyncOrchestrator,
    pub admin_token: Arc<str>,
}

impl AppState {
    pub fn new(orchestrator: SyncOrchestrator, admin_token: impl Into<Arc<str>>) -> Self {
        Self {
            store: orchestrator.store().clone(),
            orchestrator,
            admin_token: admin_token.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
}

impl From<CurationError> for ApiError {
    fn from(e: CurationError) -> Self {
        match e {
            CurationError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            CurationError::Invalid(msg) => ApiError::BadRequest(msg),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn authorize(headers: &HeaderMap, state: &AppState) -> Result<(), ApiError> {
    let supplied = headers
        .get(ADMIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if supplied.is_empty() || supplied != &*state.admin_token {
        tracing::warn!(target: "api", "admin request rejected");
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/overview", get(overview))
        .route("/api/projects", get(projects))
        .route("/api/projects/{id}", get(project))
        .route("/api/news", get(news))
        .route("/api/news/{id}", get(news_item))
        .route("/api/cities", get(cities))
        .route("/api/domains", get(domains))
        .route("/api/map/layers", get(map_layers))
        .route("/api/map/features", get(map_features))
        .route("/api/media/feeds", get(media_feeds))
        .route("/api/resilience", get(resilience))
        .route("/api/changes", get(changes))
        .route("/api/activity", get(activity))
        .route("/api/social-listening", get(social_listening))
        .route("/api/impact", get(impact))
        .route("/api/sources", get(sources))
        .route("/api/market", get(market))
        .route("/api/time", get(time_snapshot))
        .route("/api/briefing", get(briefing))
        .route("/api/admin/sources/sync", post(admin_sync))
        .route("/api/admin/sources/health", get(admin_health))
        .route("/api/admin/news", post(admin_create_news))
        .route("/api/admin/news/{id}", patch(admin_update_news))
        .route("/api/admin/projects", post(admin_create_project))
        .route("/api/admin/projects/{id}", patch(admin_update_project))
        .route("/api/admin/briefings", post(admin_set_briefing))
        .route("/api/admin/media/feeds", post(admin_create_media_feed))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthOut {
    status: &'static str,
    last_sync_at: Option<chrono::DateTime<chrono::Utc>>,
}

async fn health(State(state): State<AppState>) -> Json<HealthOut> {
    Json(HealthOut {
        status: "ok",
        last_sync_at: state.store.last_sync_at(),
    })
}

async fn overview(
    State(state): State<AppState>,
    Query(filter): Query<OverviewFilter>,
) -> Json<OverviewSnapshot> {
    Json(state.store.overview(&filter))
}

async fn projects(
    State(state): State<AppState>,
    Query(filter): Query<ProjectFilter>,
) -> Json<Vec<ProjectRecord>> {
    Json(state.store.projects(&filter))
}

async fn project(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<ProjectRecord> {
    state
        .store
        .project(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("project {id} not found")))
}

async fn news(State(state): State<AppState>, Query(filter): Query<NewsFilter>) -> Json<Vec<NewsItem>> {
    Json(state.store.news(&filter))
}

async fn news_item(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<NewsItem> {
    state
        .store
        .news_item(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("news item {id} not found")))
}

async fn cities(State(state): State<AppState>) -> Json<Vec<CityProfile>> {
    Json(state.store.cities())
}

async fn domains(State(state): State<AppState>) -> Json<Vec<DomainScorecard>> {
    Json(state.store.domains())
}

async fn map_layers(State(state): State<AppState>) -> Json<Vec<MapLayerConfig>> {
    Json(state.store.map_layers())
}

#[derive(Deserialize)]
struct LayerQuery {
    layer: Option<String>,
}

async fn map_features(
    State(state): State<AppState>,
    Query(q): Query<LayerQuery>,
) -> Json<Vec<MapFeatureCollection>> {
    Json(state.store.map_features(q.layer.as_deref()))
}

#[derive(Deserialize)]
struct MediaQuery {
    kind: Option<MediaKind>,
}

async fn media_feeds(
    State(state): State<AppState>,
    Query(q): Query<MediaQuery>,
) -> Json<Vec<MediaFeedItem>> {
    Json(state.store.media_feeds(q.kind))
}

async fn resilience(State(state): State<AppState>) -> Json<ResilienceSnapshot> {
    Json(state.store.resilience())
}

async fn changes(State(state): State<AppState>) -> Json<ChangePulse> {
    Json(state.store.change_pulse())
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

async fn activity(
    State(state): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> Json<Vec<ActivityLogItem>> {
    Json(state.store.activity(q.limit))
}

async fn social_listening(State(state): State<AppState>) -> Json<SocialListeningSnapshot> {
    Json(state.store.social_listening())
}

async fn impact(State(state): State<AppState>) -> Json<OfficialImpactSnapshot> {
    Json(state.store.official_impact())
}

async fn sources(State(state): State<AppState>) -> Json<Vec<SourceRecord>> {
    Json(state.store.sources())
}

async fn market(State(state): State<AppState>) -> Json<MarketSnapshot> {
    Json(state.store.market())
}

async fn time_snapshot(State(state): State<AppState>) -> Json<TimeSnapshot> {
    Json(state.store.time())
}

async fn briefing(State(state): State<AppState>) -> Json<BriefingNote> {
    Json(state.store.briefing())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncOut {
    results: Vec<SourceHealthRecord>,
    last_sync_at: Option<chrono::DateTime<chrono::Utc>>,
}

async fn admin_sync(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<SyncOut> {
    authorize(&headers, &state)?;
    tracing::info!(target: "api", "manual sync triggered");
    let results = state.orchestrator.run_once().await;
    Ok(Json(SyncOut {
        results,
        last_sync_at: state.store.last_sync_at(),
    }))
}

async fn admin_health(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<SourceHealthRecord>> {
    authorize(&headers, &state)?;
    Ok(Json(state.store.sync_health()))
}

async fn admin_create_news(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<NewsDraft>,
) -> Result<(StatusCode, Json<NewsItem>), ApiError> {
    authorize(&headers, &state)?;
    Ok((StatusCode::CREATED, Json(state.store.create_news(draft))))
}

async fn admin_update_news(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<NewsPatch>,
) -> ApiResult<NewsItem> {
    authorize(&headers, &state)?;
    Ok(Json(state.store.update_news(&id, patch)?))
}

async fn admin_create_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<ProjectDraft>,
) -> Result<(StatusCode, Json<ProjectRecord>), ApiError> {
    authorize(&headers, &state)?;
    let record = state.store.create_project(draft)?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn admin_update_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<ProjectPatch>,
) -> ApiResult<ProjectRecord> {
    authorize(&headers, &state)?;
    Ok(Json(state.store.update_project(&id, patch)?))
}

async fn admin_set_briefing(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<BriefingDraft>,
) -> ApiResult<BriefingNote> {
    authorize(&headers, &state)?;
    Ok(Json(state.store.set_briefing(draft)))
}

async fn admin_create_media_feed(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<MediaFeedDraft>,
) -> Result<(StatusCode, Json<MediaFeedItem>), ApiError> {
    authorize(&headers, &state)?;
    let item = state.store.create_media_feed(draft)?;
    Ok((StatusCode::CREATED, Json(item)))
}
