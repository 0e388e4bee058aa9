use axum::{
    Router,
    routing::{get, post},
};

use super::handlers::{get_leaderboard, navigate, open_session};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/leaderboards/:category", get(get_leaderboard))
        .route("/leaderboards/:category/sessions", post(open_session))
        .route("/sessions/:session_id/events", post(navigate))
}
