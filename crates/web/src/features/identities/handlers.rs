use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    dto::identity::{ProfileResponse, RefreshResponse, RegisterRequest, RegistrationResponse},
    models::{IdentityId, UpsertOutcome},
};
use validator::Validate;

use crate::error::WebError;
use crate::middleware::auth::Actor;
use crate::state::AppState;

use super::services;

fn registration_response(response: RegistrationResponse) -> Response {
    let status = match response.outcome {
        UpsertOutcome::Created => StatusCode::CREATED,
        UpsertOutcome::Updated => StatusCode::OK,
    };
    (status, Json(response)).into_response()
}

#[utoipa::path(
    post,
    path = "/api/identities",
    request_body = RegisterRequest,
    params(
        ("x-actor-id" = i64, Header, description = "Chat identity the request is made for")
    ),
    responses(
        (status = 201, description = "Identity linked", body = RegistrationResponse),
        (status = 200, description = "Existing identity relinked", body = RegistrationResponse),
        (status = 400, description = "Invalid username or missing actor"),
        (status = 401, description = "Unauthorized - Invalid or missing API key"),
        (status = 403, description = "Actor is not the identity being linked"),
        (status = 404, description = "Chess.com account does not exist"),
        (status = 502, description = "Chess.com unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "identities"
)]
pub async fn register(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<RegisterRequest>,
) -> Result<Response, WebError> {
    request.validate()?;
    actor.ensure_is(request.identity_id)?;

    let response = services::register(&state, request.identity_id, &request.username).await?;

    Ok(registration_response(response))
}

#[utoipa::path(
    post,
    path = "/api/admin/identities",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Identity linked", body = RegistrationResponse),
        (status = 200, description = "Existing identity relinked", body = RegistrationResponse),
        (status = 401, description = "Unauthorized - Invalid or missing API key"),
        (status = 404, description = "Chess.com account does not exist")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "admin"
)]
pub async fn admin_register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Response, WebError> {
    request.validate()?;

    let response = services::register(&state, request.identity_id, &request.username).await?;

    Ok(registration_response(response))
}

#[utoipa::path(
    delete,
    path = "/api/identities/{identity_id}",
    params(
        ("identity_id" = i64, Path, description = "Chat identity id"),
        ("x-actor-id" = i64, Header, description = "Chat identity the request is made for")
    ),
    responses(
        (status = 204, description = "Identity and its ratings removed"),
        (status = 401, description = "Unauthorized - Invalid or missing API key"),
        (status = 403, description = "Actor is not the identity being unlinked"),
        (status = 404, description = "Identity not registered")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "identities"
)]
pub async fn unregister(
    State(state): State<AppState>,
    actor: Actor,
    Path(identity_id): Path<IdentityId>,
) -> Result<Response, WebError> {
    actor.ensure_is(identity_id)?;
    services::unregister(&state, identity_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    delete,
    path = "/api/admin/identities/by-name/{username}",
    params(
        ("username" = String, Path, description = "Chess.com username")
    ),
    responses(
        (status = 204, description = "Identity and its ratings removed"),
        (status = 401, description = "Unauthorized - Invalid or missing API key"),
        (status = 404, description = "No identity linked to the username")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "admin"
)]
pub async fn admin_unregister(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Response, WebError> {
    services::unregister_by_name(&state, &username).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    get,
    path = "/api/identities/{identity_id}/profile",
    params(
        ("identity_id" = i64, Path, description = "Chat identity id")
    ),
    responses(
        (status = 200, description = "Latest stored ratings", body = ProfileResponse),
        (status = 404, description = "Not registered or no ratings stored yet")
    ),
    tag = "identities"
)]
pub async fn profile(
    State(state): State<AppState>,
    Path(identity_id): Path<IdentityId>,
) -> Result<Response, WebError> {
    let profile = services::profile(&state, identity_id).await?;

    Ok(Json(profile).into_response())
}

#[utoipa::path(
    post,
    path = "/api/identities/{identity_id}/refresh",
    params(
        ("identity_id" = i64, Path, description = "Chat identity id")
    ),
    responses(
        (status = 200, description = "Ratings refreshed", body = RefreshResponse),
        (status = 401, description = "Unauthorized - Invalid or missing API key"),
        (status = 404, description = "Identity not registered"),
        (status = 502, description = "Chess.com unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "identities"
)]
pub async fn refresh(
    State(state): State<AppState>,
    Path(identity_id): Path<IdentityId>,
) -> Result<Response, WebError> {
    let snapshot = state.scheduler.refresh_identity(identity_id).await?;

    Ok(Json(RefreshResponse {
        identity_id,
        snapshot,
    })
    .into_response())
}

#[utoipa::path(
    post,
    path = "/api/admin/sync",
    responses(
        (status = 202, description = "Sweep started in the background"),
        (status = 401, description = "Unauthorized - Invalid or missing API key"),
        (status = 409, description = "A sweep is already running")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "admin"
)]
pub async fn trigger_sync(State(state): State<AppState>) -> Result<Response, WebError> {
    state.scheduler.clone().spawn_sweep()?;

    Ok(StatusCode::ACCEPTED.into_response())
}
