//! Cookie-based session binding.
//!
//! Each browser gets an opaque `SessionId` cookie; the registry maps it to
//! the caller's `CartSession`. Handlers load the binding, hand it to the
//! ordering service and write it back afterwards.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use common::SessionId;
use domain::CartSession;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::error::ApiError;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "storefront_session";

struct SessionEntry {
    cart: CartSession,
    last_seen: Instant,
}

/// Server-side table of session bindings.
///
/// Bindings live in process memory only. A restart forgets every binding,
/// so carts stored in Postgres outlive the sessions that point at them and
/// are no longer reachable from the old cookie. Bindings that go unused for
/// longer than the configured idle time are dropped by `evict_idle`.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the binding for `id`, or an unbound session if none is stored.
    ///
    /// A stored binding counts as used and its idle clock restarts.
    pub async fn load(&self, id: SessionId) -> CartSession {
        match self.sessions.write().await.get_mut(&id) {
            Some(entry) => {
                entry.last_seen = Instant::now();
                entry.cart
            }
            None => CartSession::default(),
        }
    }

    /// Stores the binding for `id`. Unbound sessions are dropped from the table.
    pub async fn save(&self, id: SessionId, session: CartSession) {
        let mut sessions = self.sessions.write().await;
        if session.is_bound() {
            sessions.insert(
                id,
                SessionEntry {
                    cart: session,
                    last_seen: Instant::now(),
                },
            );
        } else {
            sessions.remove(&id);
        }
    }

    /// Returns the number of sessions currently bound to an order.
    pub async fn bound_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops bindings unused for at least `max_idle`. Returns how many went.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen.elapsed() < max_idle);
        before - sessions.len()
    }

    /// Runs `evict_idle` periodically for the life of the process.
    pub fn spawn_eviction(&self, max_idle: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        let period = max_idle.clamp(Duration::from_secs(1), Duration::from_secs(60));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let evicted = registry.evict_idle(max_idle).await;
                if evicted > 0 {
                    tracing::debug!(evicted, "dropped idle session bindings");
                }
            }
        })
    }
}

/// The caller's session id, taken from the cookie or freshly minted.
#[derive(Debug, Clone, Copy)]
pub struct SessionHandle {
    pub id: SessionId,
    pub is_new: bool,
}

impl SessionHandle {
    fn from_headers(headers: &HeaderMap) -> Self {
        let existing = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .and_then(|(_, value)| SessionId::parse(value));

        match existing {
            Some(id) => Self { id, is_new: false },
            None => Self {
                id: SessionId::new(),
                is_new: true,
            },
        }
    }

    /// Adds the `Set-Cookie` header when the session was created by this request.
    pub fn attach(&self, mut response: Response) -> Response {
        if self.is_new {
            let cookie = format!("{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", self.id);
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
        response
    }

    /// Renders a handler result and attaches the cookie on success and failure
    /// alike, so a binding saved before an error stays reachable.
    pub fn respond(&self, result: Result<Response, ApiError>) -> Response {
        self.attach(result.into_response())
    }
}

impl<S> FromRequestParts<S> for SessionHandle
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use common::OrderId;
    use domain::DomainError;

    use super::*;

    #[test]
    fn reads_session_cookie_among_others() {
        let id = SessionId::new();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}={id}; lang=en")).unwrap(),
        );

        let handle = SessionHandle::from_headers(&headers);
        assert_eq!(handle.id, id);
        assert!(!handle.is_new);
    }

    #[test]
    fn malformed_cookie_starts_new_session() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{SESSION_COOKIE}=garbage")).unwrap(),
        );

        let handle = SessionHandle::from_headers(&headers);
        assert!(handle.is_new);
    }

    #[test]
    fn attach_sets_cookie_only_for_new_sessions() {
        let fresh = SessionHandle::from_headers(&HeaderMap::new());
        let response = fresh.attach(().into_response());
        let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with(&format!("{SESSION_COOKIE}={}", fresh.id)));
        assert!(cookie.contains("HttpOnly"));

        let known = SessionHandle {
            id: fresh.id,
            is_new: false,
        };
        let response = known.attach(().into_response());
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn registry_round_trips_bindings() {
        let registry = SessionRegistry::new();
        let id = SessionId::new();

        assert!(!registry.load(id).await.is_bound());

        registry.save(id, CartSession::bound_to(OrderId::new(4))).await;
        assert_eq!(registry.load(id).await.order_id(), Some(OrderId::new(4)));
        assert_eq!(registry.bound_count().await, 1);

        registry.save(id, CartSession::new()).await;
        assert_eq!(registry.bound_count().await, 0);
    }

    #[test]
    fn new_session_cookie_survives_error_responses() {
        let fresh = SessionHandle::from_headers(&HeaderMap::new());
        let response = fresh.respond(Err(ApiError::Domain(DomainError::NoActiveOrder)));

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(SET_COOKIE).is_some());
    }

    #[tokio::test]
    async fn idle_bindings_are_evicted() {
        let registry = SessionRegistry::new();
        let id = SessionId::new();
        registry.save(id, CartSession::bound_to(OrderId::new(8))).await;

        assert_eq!(registry.evict_idle(Duration::from_secs(3600)).await, 0);
        assert_eq!(registry.bound_count().await, 1);

        assert_eq!(registry.evict_idle(Duration::ZERO).await, 1);
        assert!(!registry.load(id).await.is_bound());
    }
}
