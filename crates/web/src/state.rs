use std::sync::Arc;

use importer::SyncScheduler;
use storage::RatingStore;

use crate::features::leaderboard::sessions::SessionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RatingStore>,
    pub scheduler: Arc<SyncScheduler>,
    pub sessions: Arc<SessionRegistry>,
}
