//! Sessions.
//!
//! A [`Session`] is a plain value. The [`manage`] middleware loads one before every request and
//! puts it into the request's extensions, where handlers pick it up with the [`Session`]
//! extractor. A handler that changes the session returns the new value as part of its response
//! (`Session` implements [`IntoResponseParts`]), and the middleware writes it back to the
//! [`SessionStore`].

use std::convert::Infallible;

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::response::{IntoResponse, IntoResponseParts, Response, ResponseParts};

use crate::identity::{serialize_identity, UserIdentity};
use crate::response::ErrorResponse;

/// Name of the cookie carrying the [`SessionKey`].
pub const COOKIE_NAME: &str = "signon.sid";

mod key;
pub use key::{ParseSessionKeyError, SessionKey};

mod store;
pub use store::{MemoryStore, SessionStore, StoreError};

mod manager;
pub use manager::{manage, Manager};

/// A user's session.
#[derive(Debug, Clone)]
pub struct Session {
    key: SessionKey,
    identity: Option<UserIdentity>,
    persistence: Persistence,

    /// The key this session was stored under before it was rotated.
    stale_key: Option<SessionKey>,
}

/// Whether a session is anonymous or belongs to a logged-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Anonymous,
    Authenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Persistence {
    /// The store doesn't have this session's current state yet.
    Unsaved,

    /// The store has this session's current state.
    Saved,

    /// This session has been logged out and must be removed from the store.
    Destroyed,
}

/// The persisted form of a [`Session`].
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub(crate) struct SessionData {
    pub identity: Option<String>,
}

impl Session {
    /// Creates a new anonymous session.
    pub fn new() -> Self {
        Self::unsaved(SessionKey::new())
    }

    /// An anonymous session under an existing key, which will overwrite whatever is stored there.
    pub(crate) fn unsaved(key: SessionKey) -> Self {
        Self {
            key,
            identity: None,
            persistence: Persistence::Unsaved,
            stale_key: None,
        }
    }

    /// A session as it was loaded from the store.
    pub(crate) fn restore(key: SessionKey, identity: Option<UserIdentity>) -> Self {
        Self {
            key,
            identity,
            persistence: Persistence::Saved,
            stale_key: None,
        }
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }

    pub fn identity(&self) -> Option<&UserIdentity> {
        self.identity.as_ref()
    }

    pub fn state(&self) -> State {
        match self.identity {
            None => State::Anonymous,
            Some(_) => State::Authenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == State::Authenticated
    }

    pub fn is_destroyed(&self) -> bool {
        self.persistence == Persistence::Destroyed
    }

    pub(crate) fn is_saved(&self) -> bool {
        self.persistence == Persistence::Saved
    }

    pub(crate) fn stale_key(&self) -> Option<SessionKey> {
        self.stale_key
    }

    /// Attaches `identity` to this session.
    ///
    /// The session gets a fresh key, so a key that was handed out before login can't be used to
    /// ride on the authenticated session. The old key is removed from the store.
    pub fn authenticate(self, identity: UserIdentity) -> Self {
        let stale_key = match self.persistence {
            Persistence::Saved => Some(self.key),
            Persistence::Unsaved | Persistence::Destroyed => self.stale_key,
        };

        Self {
            key: SessionKey::new(),
            identity: Some(identity),
            persistence: Persistence::Unsaved,
            stale_key,
        }
    }

    /// Logs the session out.
    ///
    /// A destroyed session is anonymous; it is removed from the store and its cookie is cleared.
    pub fn destroy(self) -> Self {
        Self {
            identity: None,
            persistence: Persistence::Destroyed,
            ..self
        }
    }

    pub(crate) fn data(&self) -> SessionData {
        SessionData { identity: self.identity.as_ref().map(serialize_identity) }
    }
}

#[derive(Debug, Display, Error)]
pub enum SessionRejection {
    #[display("session middleware is not installed")]
    MissingMiddleware,

    #[display("you are not logged in")]
    Anonymous,
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        match self {
            Self::MissingMiddleware => ErrorResponse::internal_server_error(self).into_response(),
            Self::Anonymous => ErrorResponse::unauthorized().into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(
        request: &mut http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        request
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(SessionRejection::MissingMiddleware)
    }
}

/// Hands a (possibly changed) session back to the [`manage`] middleware.
impl IntoResponseParts for Session {
    type Error = Infallible;

    fn into_response_parts(self, mut response: ResponseParts) -> Result<ResponseParts, Self::Error> {
        response.extensions_mut().insert(self);
        Ok(response)
    }
}

/// Extracts the identity of a logged-in user, rejecting anonymous sessions with a `401`.
#[derive(Debug, Clone)]
pub struct Authenticated(pub UserIdentity);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(
        request: &mut http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(request, state).await?;

        session
            .identity
            .map(Self)
            .ok_or(SessionRejection::Anonymous)
    }
}

impl<S> OptionalFromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(
        request: &mut http::request::Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        match <Self as FromRequestParts<S>>::from_request_parts(request, state).await {
            Ok(authenticated) => Ok(Some(authenticated)),
            Err(SessionRejection::Anonymous) => Ok(None),
            Err(rejection) => Err(rejection),
        }
    }
}
