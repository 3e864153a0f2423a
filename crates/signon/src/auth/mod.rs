//! The login lifecycle.
//!
//! ```text
//! Anonymous --initiate_login--> (at the provider) --handle_provider_return--> Authenticated
//!     ^                                  |                                          |
//!     +------------- rejected -----------+                                          |
//!     +------------------------------------ logout -------------------------------+
//! ```
//!
//! Nothing is stored while the user is at the provider; the session only ever observes
//! [`State::Anonymous`] and [`State::Authenticated`].
//!
//! [`State::Anonymous`]: crate::session::State::Anonymous
//! [`State::Authenticated`]: crate::session::State::Authenticated

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::identity::UserIdentity;
use crate::session::Session;

mod error;
pub use error::{AuthError, ProviderRejection, FAILURE_REDIRECT};

mod provider;
pub use provider::{Assertion, IdentityProvider, InitializeProviderError, SteamProvider, RETURN_PATH};

pub use crate::identity::{deserialize_identity, serialize_identity};

pub(crate) mod http;

/// Decides what happens to a session at every step of the login lifecycle.
#[derive(Clone)]
pub struct Authenticator {
    provider: Arc<dyn IdentityProvider>,
}

impl Authenticator {
    pub fn new(provider: impl IdentityProvider) -> Self {
        Self { provider: Arc::new(provider) }
    }

    /// Returns the URL to send the user to for login.
    ///
    /// The session is not touched; the user is still anonymous until they come back.
    pub fn initiate_login(&self) -> Url {
        self.provider.login_url().clone()
    }

    /// Processes the assertion the provider sent the user back with.
    ///
    /// On success, the returned session is authenticated as the asserted user. On failure, the
    /// session is returned as it was.
    #[tracing::instrument(skip_all, fields(session.key = %session.key()))]
    pub async fn handle_provider_return(
        &self,
        session: Session,
        assertion: &Assertion,
    ) -> (Session, Result<UserIdentity, AuthError>) {
        let claimed_id = match self.provider.verify(assertion).await {
            Ok(claimed_id) => claimed_id,
            Err(rejection) => {
                info!(%rejection, "provider rejected login");
                return (session, Err(rejection.into()));
            },
        };

        let identity = match UserIdentity::from_claimed_id(claimed_id) {
            Ok(identity) => identity,
            Err(error) => {
                warn!(%error, "provider confirmed a malformed identifier");
                return (session, Err(error.into()));
            },
        };

        info!(user.id = %identity.numeric_id(), "user logged in");

        (session.authenticate(identity.clone()), Ok(identity))
    }

    /// Logs `session` out. This always succeeds.
    #[tracing::instrument(level = "debug", skip_all, fields(session.key = %session.key()))]
    pub fn logout(&self, session: Session) -> Session {
        if let Some(identity) = session.identity() {
            info!(user.id = %identity.numeric_id(), "user logged out");
        }

        session.destroy()
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Authenticator").finish_non_exhaustive()
    }
}
