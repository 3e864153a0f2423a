use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;

use super::{Session, SessionData, SessionKey, SessionStore, StoreError, COOKIE_NAME};
use crate::auth::AuthError;
use crate::config::CookieConfig;
use crate::identity::deserialize_identity;

/// State for the [`manage`] middleware.
#[derive(Clone)]
pub struct Manager {
    store: Arc<dyn SessionStore>,
    cookie_config: Arc<CookieConfig>,

    /// How long anonymous sessions are stored for.
    anonymous_ttl: time::Duration,
}

impl Manager {
    /// Authenticated sessions are stored for the cookie's `max_age`, anonymous ones for
    /// `anonymous_ttl` (but never longer than `max_age`).
    pub fn new(
        store: Arc<dyn SessionStore>,
        cookie_config: impl Into<Arc<CookieConfig>>,
        anonymous_ttl: time::Duration,
    ) -> Self {
        let cookie_config = cookie_config.into();
        let anonymous_ttl = anonymous_ttl.min(cookie_config.max_age);

        Self { store, cookie_config, anonymous_ttl }
    }

    fn ttl_for(&self, session: &Session) -> time::Duration {
        if session.is_authenticated() {
            self.cookie_config.max_age
        } else {
            self.anonymous_ttl
        }
    }

    /// Loads the session referenced by the request's cookie.
    ///
    /// Anything that doesn't lead to a usable stored session yields a fresh anonymous one. Only
    /// an unreachable store is an error.
    async fn load(&self, cookies: &CookieJar) -> Result<Session, StoreError> {
        let Some(cookie) = cookies.get(COOKIE_NAME) else {
            trace!("no session cookie");
            return Ok(Session::new());
        };

        let key = match cookie.value().parse::<SessionKey>() {
            Ok(key) => key,
            Err(error) => {
                debug!(%error, "ignoring malformed session cookie");
                return Ok(Session::new());
            },
        };

        let Some(value) = self.store.get(key).await? else {
            debug!(%key, "session unknown or expired");
            return Ok(Session::new());
        };

        let data = match serde_json::from_str::<SessionData>(&value) {
            Ok(data) => data,
            Err(error) => {
                warn!(%key, %error, "discarding undecodable session data");
                return Ok(Session::unsaved(key));
            },
        };

        match data.identity.as_deref().map(deserialize_identity).transpose() {
            Ok(identity) => Ok(Session::restore(key, identity)),
            Err(error) => {
                warn!(%key, %error, "discarding session with malformed identity");
                Ok(Session::unsaved(key))
            },
        }
    }

    /// Writes `session` back to the store and records the matching cookie in `cookies`.
    async fn persist(&self, session: Session, cookies: CookieJar) -> Result<CookieJar, StoreError> {
        if let Some(stale_key) = session.stale_key() {
            if let Err(error) = self.store.delete(stale_key).await {
                warn!(%stale_key, %error, "failed to delete rotated session key");
            }
        }

        if session.is_destroyed() {
            if let Err(error) = self.store.delete(session.key()).await {
                error!(key = %session.key(), %error, "failed to delete destroyed session");
            }

            let cookie = self
                .cookie_config
                .build_cookie(COOKIE_NAME, "")
                .removal()
                .build();

            return Ok(cookies.add(cookie));
        }

        let value = serde_json::to_string(&session.data())
            .expect("session data should always serialize");

        self.store
            .set(session.key(), value, self.ttl_for(&session))
            .await?;

        let cookie = self
            .cookie_config
            .build_cookie(COOKIE_NAME, session.key().to_string())
            .build();

        Ok(cookies.add(cookie))
    }
}

/// Session middleware.
///
/// Loads the request's [`Session`] and makes it available to the handler. Afterwards:
///
/// - a session returned by the handler is persisted (or deleted, if it was destroyed)
/// - otherwise, a session that has never been saved is saved now, so first-time visitors get a
///   cookie
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(session.key = tracing::field::Empty),
    err(level = "debug"),
)]
pub async fn manage(
    manager: Manager,
    cookies: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let session = manager.load(&cookies).await?;

    tracing::Span::current().record("session.key", tracing::field::display(session.key()));
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    let session = match response.extensions_mut().remove::<Session>() {
        Some(returned) => returned,
        None if !session.is_saved() => session,
        None => return Ok(response),
    };

    let cookies = manager.persist(session, cookies).await?;

    Ok((cookies, response).into_response())
}

impl fmt::Debug for Manager {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Manager")
            .field("cookie_config", &self.cookie_config)
            .field("anonymous_ttl", &self.anonymous_ttl)
            .finish_non_exhaustive()
    }
}

impl<S> FromRequestParts<S> for Manager
where
    S: Send + Sync,
    Self: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        _: &mut http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_ref(state))
    }
}
