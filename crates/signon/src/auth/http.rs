//! HTTP handlers for `/auth`.

use std::sync::Arc;

use axum::extract::{RawQuery, State};
use axum::response::Redirect;
use axum::routing::{get, post};
use axum::Router;
use url::Url;

use super::{Assertion, AuthError, Authenticator};
use crate::session::Session;

#[derive(Debug, Clone)]
struct LogoutState {
    authenticator: Authenticator,
    public_url: Arc<Url>,
}

pub fn router<S>(authenticator: Authenticator, public_url: impl Into<Arc<Url>>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let logout_state = LogoutState {
        authenticator: authenticator.clone(),
        public_url: public_url.into(),
    };

    Router::new()
        .route("/login", post(login).with_state(authenticator.clone()))
        .route("/return", get(provider_return).with_state(authenticator))
        .route("/logout", post(logout).with_state(logout_state))
}

/// Sends the user to the provider.
#[tracing::instrument(level = "debug", skip_all, ret(level = "debug"))]
async fn login(State(authenticator): State<Authenticator>) -> Redirect {
    Redirect::to(authenticator.initiate_login().as_str())
}

/// The provider sends users back here, with its assertion in the query string.
#[tracing::instrument(level = "debug", skip_all, fields(session.key = %session.key()))]
async fn provider_return(
    State(authenticator): State<Authenticator>,
    session: Session,
    RawQuery(query): RawQuery,
) -> Result<(Session, Redirect), (Session, AuthError)> {
    let assertion = Assertion::new(query.unwrap_or_default());

    match authenticator.handle_provider_return(session, &assertion).await {
        (session, Ok(identity)) => {
            Ok((session, Redirect::to(&format!("/?id={}", identity.numeric_id()))))
        },
        (session, Err(error)) => Err((session, error)),
    }
}

#[tracing::instrument(level = "debug", skip_all, fields(session.key = %session.key()))]
async fn logout(
    State(LogoutState { authenticator, public_url }): State<LogoutState>,
    session: Session,
    headers: http::HeaderMap,
) -> (Session, Redirect) {
    let redirect_to = referer(&headers, &public_url);

    (authenticator.logout(session), Redirect::to(redirect_to.as_deref().unwrap_or("/")))
}

/// Returns the `Referer`, if it points back at us.
fn referer(headers: &http::HeaderMap, public_url: &Url) -> Option<String> {
    let referer = headers
        .get(http::header::REFERER)?
        .to_str()
        .ok()?
        .parse::<Url>()
        .ok()?;

    let same_origin = referer.scheme() == public_url.scheme()
        && referer.host_str() == public_url.host_str()
        && referer.port_or_known_default() == public_url.port_or_known_default();

    if !same_origin {
        debug!(referer = referer.as_str(), "ignoring foreign referer");
        return None;
    }

    Some(referer.into())
}
