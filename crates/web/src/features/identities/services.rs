use importer::ChessComSource;
use storage::{
    dto::identity::{ProfileResponse, RegistrationResponse},
    models::IdentityId,
    services::aggregation,
};
use tracing::{info, warn};

use crate::error::{ApiResult, WebError};
use crate::state::AppState;

/// Confirm the account on Chess.com, link it to `identity_id` and store its
/// first ratings. A failed ratings write still leaves the identity linked.
pub async fn register(
    state: &AppState,
    identity_id: IdentityId,
    username: &str,
) -> ApiResult<RegistrationResponse> {
    let values = state.scheduler.fetch(username).await?;
    let outcome = state.store.upsert_identity(identity_id, username).await?;
    info!("Registered {} as '{}' ({:?})", identity_id, username, outcome);

    let ratings_stored = match state.store.upsert_snapshot(identity_id, &values).await {
        Ok(_) => true,
        Err(e) => {
            warn!("Stored identity {} but not its ratings: {}", identity_id, e);
            false
        }
    };

    Ok(RegistrationResponse {
        identity_id,
        username: username.to_string(),
        outcome,
        ratings_stored,
    })
}

pub async fn unregister(state: &AppState, identity_id: IdentityId) -> ApiResult<()> {
    if state.store.delete_identity(identity_id).await? {
        info!("Unregistered {}", identity_id);
        Ok(())
    } else {
        Err(WebError::NotFound(format!("Identity {} is not registered", identity_id)))
    }
}

pub async fn unregister_by_name(state: &AppState, username: &str) -> ApiResult<IdentityId> {
    match state.store.delete_identity_by_name(username).await? {
        Some(identity_id) => {
            info!("Unregistered '{}' ({})", username, identity_id);
            Ok(identity_id)
        }
        None => Err(WebError::NotFound(format!(
            "No identity is linked to '{}'",
            username
        ))),
    }
}

pub async fn profile(state: &AppState, identity_id: IdentityId) -> ApiResult<ProfileResponse> {
    let identity = state
        .store
        .get_identity(identity_id)
        .await?
        .ok_or_else(|| WebError::NotFound(format!("Identity {} is not registered", identity_id)))?;
    let snapshot = state
        .store
        .get_latest_snapshot(identity_id)
        .await?
        .ok_or_else(|| WebError::NotFound(format!("No ratings stored for {}", identity_id)))?;

    Ok(ProfileResponse {
        identity_id,
        profile_url: ChessComSource::profile_url(&identity.account_name),
        username: identity.account_name,
        ratings: snapshot.values,
        average: aggregation::overall_score(&snapshot.values).map(|score| score as i64),
        updated_at: snapshot.updated_at,
    })
}
