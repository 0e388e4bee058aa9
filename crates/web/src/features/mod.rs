pub mod identities;
pub mod leaderboard;

use axum::Router;

use crate::middleware::auth::ApiKeys;
use crate::state::AppState;

pub fn router(state: AppState, api_keys: ApiKeys) -> Router {
    let api = identities::routes::routes(api_keys).merge(leaderboard::routes::routes());

    Router::new().nest("/api", api).with_state(state)
}
