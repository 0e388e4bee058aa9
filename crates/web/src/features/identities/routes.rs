use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use super::handlers::{
    admin_register, admin_unregister, profile, refresh, register, trigger_sync, unregister,
};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    let protected = Router::new()
        .route("/identities", post(register))
        .route("/identities/:identity_id", delete(unregister))
        .route("/identities/:identity_id/refresh", post(refresh))
        .route("/admin/identities", post(admin_register))
        .route("/admin/identities/by-name/:username", delete(admin_unregister))
        .route("/admin/sync", post(trigger_sync))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/identities/:identity_id/profile", get(profile))
        .merge(protected)
}
