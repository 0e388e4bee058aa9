use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use storage::{
    dto::{
        common::{PaginatedResponse, PaginationParams},
        ranking::{Category, RankedEntry},
    },
    models::IdentityId,
};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{NOT_OWNER_NOTICE, WebError};
use crate::state::AppState;

use super::render::RenderedPage;
use super::services;
use super::sessions::NavigationError;
use super::view::NavigationAction;

#[derive(Debug, Deserialize, ToSchema)]
pub struct OpenSessionRequest {
    pub actor_id: IdentityId,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NavigationRequest {
    pub actor_id: IdentityId,
    pub action: NavigationAction,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    /// Absent when the whole leaderboard fits on one page.
    pub session_id: Option<Uuid>,
    pub page: RenderedPage,
}

fn parse_category(raw: &str) -> Result<Category, WebError> {
    raw.parse().map_err(WebError::BadRequest)
}

#[utoipa::path(
    get,
    path = "/api/leaderboards/{category}",
    params(
        ("category" = String, Path, description = "rapid, blitz, bullet, puzzle, puzzle_rush or overall"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Ranked identities", body = PaginatedResponse<RankedEntry>),
        (status = 400, description = "Unknown category or invalid pagination")
    ),
    tag = "leaderboards"
)]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, WebError> {
    let category = parse_category(&category)?;
    pagination.validate().map_err(WebError::BadRequest)?;

    let ranking = services::get_ranking(state.store.as_ref(), category).await?;
    let total_items = ranking.len() as i64;
    let data = pagination.slice(&ranking).to_vec();

    let response = PaginatedResponse::new(data, pagination.page, pagination.page_size, total_items);

    Ok(Json(response).into_response())
}

#[utoipa::path(
    post,
    path = "/api/leaderboards/{category}/sessions",
    params(
        ("category" = String, Path, description = "Leaderboard category")
    ),
    request_body = OpenSessionRequest,
    responses(
        (status = 201, description = "First page rendered", body = SessionResponse),
        (status = 400, description = "Unknown category")
    ),
    tag = "leaderboards"
)]
pub async fn open_session(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Json(request): Json<OpenSessionRequest>,
) -> Result<Response, WebError> {
    let category = parse_category(&category)?;
    let data = services::load_leaderboard(state.store.as_ref(), category).await?;

    let (session_id, page) = state.sessions.open(request.actor_id, data);

    Ok((StatusCode::CREATED, Json(SessionResponse { session_id, page })).into_response())
}

#[utoipa::path(
    post,
    path = "/api/sessions/{session_id}/events",
    params(
        ("session_id" = Uuid, Path, description = "Pagination session")
    ),
    request_body = NavigationRequest,
    responses(
        (status = 200, description = "Page after navigation", body = SessionResponse),
        (status = 403, description = "Actor did not open this session"),
        (status = 404, description = "Unknown session"),
        (status = 410, description = "Session timed out")
    ),
    tag = "leaderboards"
)]
pub async fn navigate(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<NavigationRequest>,
) -> Result<Response, WebError> {
    let page = state
        .sessions
        .navigate(session_id, request.actor_id, request.action)
        .await
        .map_err(|e| match e {
            NavigationError::UnknownSession => {
                WebError::NotFound(format!("Session {} not found", session_id))
            }
            NavigationError::NotOwner => WebError::Forbidden(NOT_OWNER_NOTICE.to_string()),
            NavigationError::Expired(page) => WebError::Gone(page),
        })?;

    Ok(Json(SessionResponse {
        session_id: Some(session_id),
        page,
    })
    .into_response())
}
