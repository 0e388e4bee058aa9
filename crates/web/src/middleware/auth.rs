use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use storage::models::IdentityId;

use crate::error::WebError;

/// Header the trusted chat front-end uses to name the user it acts for.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Rejects requests without a known `Authorization: Bearer <key>` header.
pub async fn require_auth(
    State(api_keys): State<ApiKeys>,
    request: Request,
    next: Next,
) -> Result<Response, WebError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    match token {
        Some(token) if api_keys.is_valid(token) => Ok(next.run(request).await),
        _ => {
            tracing::warn!("Invalid API key attempt");
            Err(WebError::Unauthorized)
        }
    }
}

/// The chat identity a self-service request is made on behalf of.
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub IdentityId);

impl Actor {
    /// Self-service routes may only touch the actor's own registration.
    pub fn ensure_is(self, identity_id: IdentityId) -> Result<(), WebError> {
        if self.0 == identity_id {
            Ok(())
        } else {
            tracing::warn!("Actor {} tried to change identity {}", self.0, identity_id);
            Err(WebError::Forbidden(
                "You can only link or unlink your own account.".to_string(),
            ))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<IdentityId>().ok())
            .map(Actor)
            .ok_or_else(|| WebError::BadRequest(format!("Missing or invalid {} header", ACTOR_HEADER)))
    }
}

#[derive(Clone)]
pub struct ApiKeys {
    keys: Arc<HashSet<String>>,
}

impl ApiKeys {
    pub fn from_comma_separated(keys_str: &str) -> Self {
        let keys = keys_str
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Self {
            keys: Arc::new(keys),
        }
    }

    pub fn is_valid(&self, key: &str) -> bool {
        self.keys.contains(key)
    }
}
