use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use storage::models::IdentityId;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use super::render::{LeaderboardData, RenderedPage, render};
use super::view::{NavigationAction, ViewEvent, ViewState};

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(100);

#[derive(Debug, Clone, PartialEq)]
pub enum NavigationError {
    UnknownSession,
    NotOwner,
    /// The last page shown before the session timed out.
    Expired(Box<RenderedPage>),
}

struct Session {
    owner: IdentityId,
    data: LeaderboardData,
    state: ViewState,
    current: RenderedPage,
    last_activity: Instant,
    expired_at: Option<Instant>,
}

impl Session {
    fn expire_if_idle(&mut self, idle_timeout: Duration, now: Instant) {
        if self.expired_at.is_none() && now.duration_since(self.last_activity) >= idle_timeout {
            self.state = self.state.transition(ViewEvent::Timeout, self.data.total_pages());
            self.current.controls = None;
            self.expired_at = Some(now);
        }
    }
}

/// Open paginated views, one per rendered leaderboard. Events for a single
/// session are handled one at a time.
pub struct SessionRegistry {
    sessions: DashMap<Uuid, Arc<Mutex<Session>>>,
    idle_timeout: Duration,
    retention: Duration,
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_timeout,
            retention: idle_timeout,
        }
    }

    pub fn open_count(&self) -> usize {
        self.sessions.len()
    }

    /// Render the first page. Multi-page results get a session so `owner`
    /// can navigate; a single page is returned without one.
    pub fn open(&self, owner: IdentityId, data: LeaderboardData) -> (Option<Uuid>, RenderedPage) {
        let state = ViewState::default();
        let page = render(1, &data);

        if page.controls.is_none() {
            return (None, page);
        }

        let id = Uuid::new_v4();
        let session = Session {
            owner,
            data,
            state,
            current: page.clone(),
            last_activity: Instant::now(),
            expired_at: None,
        };
        self.sessions.insert(id, Arc::new(Mutex::new(session)));
        debug!("Opened pagination session {} for {}", id, owner);

        (Some(id), page)
    }

    pub async fn navigate(
        &self,
        id: Uuid,
        actor: IdentityId,
        action: NavigationAction,
    ) -> Result<RenderedPage, NavigationError> {
        // clone out of the map so no shard lock is held across the await
        let session = self
            .sessions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(NavigationError::UnknownSession)?;
        let mut session = session.lock().await;

        if session.owner != actor {
            return Err(NavigationError::NotOwner);
        }

        let now = Instant::now();
        session.expire_if_idle(self.idle_timeout, now);

        let total = session.data.total_pages();
        session.state = session.state.transition(action.into(), total);
        match session.state.page() {
            Some(page) => {
                session.current = render(page, &session.data);
                session.last_activity = now;
                Ok(session.current.clone())
            }
            None => Err(NavigationError::Expired(Box::new(session.current.clone()))),
        }
    }

    /// Time out idle sessions and drop those that have been expired for
    /// longer than the retention period. Returns how many were dropped.
    pub async fn reap(&self) -> usize {
        let now = Instant::now();
        let entries: Vec<(Uuid, Arc<Mutex<Session>>)> = self
            .sessions
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut evicted = 0;
        for (id, session) in entries {
            let mut session = session.lock().await;
            session.expire_if_idle(self.idle_timeout, now);
            if session
                .expired_at
                .is_some_and(|at| now.duration_since(at) >= self.retention)
            {
                self.sessions.remove(&id);
                evicted += 1;
            }
        }

        if evicted > 0 {
            debug!(
                "Evicted {} expired pagination sessions, {} still open",
                evicted,
                self.open_count()
            );
        }
        evicted
    }

    pub fn spawn_reaper(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                self.reap().await;
            }
        })
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use storage::dto::ranking::{Category, RankedEntry};
    use storage::models::RatingValues;

    const OWNER: IdentityId = IdentityId(1);
    const OTHER: IdentityId = IdentityId(2);

    fn data(n: usize) -> LeaderboardData {
        LeaderboardData {
            category: Category::Rapid,
            entries: (0..n)
                .map(|i| RankedEntry {
                    rank: i as i64 + 1,
                    identity_id: IdentityId(i as i64 + 10),
                    display_name: format!("p{i}"),
                    values: RatingValues::default(),
                    score: 1000.0,
                })
                .collect(),
            last_updated: Utc::now(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_owner_navigates_in_place() {
        let registry = SessionRegistry::default();
        let (id, first) = registry.open(OWNER, data(60));
        let id = id.unwrap();
        assert_eq!(first.page, 1);

        let second = registry.navigate(id, OWNER, NavigationAction::Next).await.unwrap();
        assert_eq!(second.page, 2);

        let jumped = registry.navigate(id, OWNER, NavigationAction::Jump).await.unwrap();
        assert_eq!(jumped.page, 1);
        assert_eq!(registry.open_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_actor_is_rejected_without_changing_state() {
        let registry = SessionRegistry::default();
        let (id, _) = registry.open(OWNER, data(60));
        let id = id.unwrap();

        let rejected = registry.navigate(id, OTHER, NavigationAction::Next).await;
        assert_eq!(rejected, Err(NavigationError::NotOwner));

        let page = registry.navigate(id, OWNER, NavigationAction::Next).await.unwrap();
        assert_eq!(page.page, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_page_results_do_not_open_a_session() {
        let registry = SessionRegistry::default();
        let (id, page) = registry.open(OWNER, data(25));

        assert!(id.is_none());
        assert!(page.controls.is_none());
        assert_eq!(registry.open_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_session_expires_and_keeps_last_page() {
        let registry = SessionRegistry::default();
        let (id, _) = registry.open(OWNER, data(60));
        let id = id.unwrap();
        registry.navigate(id, OWNER, NavigationAction::Next).await.unwrap();

        tokio::time::advance(Duration::from_secs(99)).await;
        let page = registry.navigate(id, OWNER, NavigationAction::Next).await.unwrap();
        assert_eq!(page.page, 3);

        tokio::time::advance(Duration::from_secs(100)).await;
        match registry.navigate(id, OWNER, NavigationAction::Previous).await {
            Err(NavigationError::Expired(last)) => {
                assert_eq!(last.page, 3);
                assert!(last.controls.is_none());
            }
            other => panic!("expected expiry, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaper_evicts_after_retention() {
        let registry = SessionRegistry::new(Duration::from_secs(10));
        let (id, _) = registry.open(OWNER, data(60));
        let id = id.unwrap();

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(registry.reap().await, 0);
        assert!(matches!(
            registry.navigate(id, OWNER, NavigationAction::Next).await,
            Err(NavigationError::Expired(_))
        ));

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(registry.reap().await, 1);
        assert_eq!(
            registry.navigate(id, OWNER, NavigationAction::Next).await,
            Err(NavigationError::UnknownSession)
        );
    }
}
