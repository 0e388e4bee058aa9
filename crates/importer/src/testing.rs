//! Scripted doubles shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use storage::models::RatingValues;
use tokio::sync::Mutex;

use crate::error::{ImporterError, Result};
use crate::traits::RatingSource;

#[derive(Debug, Clone)]
pub enum Scripted {
    Ok(RatingValues),
    NotFound,
    RateLimited(Duration),
    Transient,
}

/// Plays back a queue of responses per username. Once a queue runs dry the
/// last response repeats.
#[derive(Default)]
pub struct ScriptedSource {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    last: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn script(&self, username: &str, responses: Vec<Scripted>) {
        self.scripts
            .lock()
            .await
            .insert(username.to_string(), responses.into());
    }

    pub async fn calls(&self, username: &str) -> usize {
        self.calls.lock().await.get(username).copied().unwrap_or(0)
    }
}

#[async_trait]
impl RatingSource for ScriptedSource {
    async fn fetch_ratings(&self, username: &str) -> Result<RatingValues> {
        *self.calls.lock().await.entry(username.to_string()).or_default() += 1;

        let next = self
            .scripts
            .lock()
            .await
            .get_mut(username)
            .and_then(|queue| queue.pop_front());
        let response = match next {
            Some(response) => {
                self.last
                    .lock()
                    .await
                    .insert(username.to_string(), response.clone());
                response
            }
            None => self
                .last
                .lock()
                .await
                .get(username)
                .cloned()
                .unwrap_or(Scripted::NotFound),
        };

        match response {
            Scripted::Ok(values) => Ok(values),
            Scripted::NotFound => Err(ImporterError::NotFound(username.to_string())),
            Scripted::RateLimited(retry_after) => Err(ImporterError::RateLimited { retry_after }),
            Scripted::Transient => Err(ImporterError::Transient("scripted failure".into())),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
