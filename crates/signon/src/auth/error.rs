use axum::response::{IntoResponse, Redirect, Response};

use crate::identity::MalformedIdentifierError;
use crate::response::ErrorResponse;
use crate::session::StoreError;

/// Where users end up after a failed login.
pub const FAILURE_REDIRECT: &str = "/?failed";

/// Everything that can go wrong while moving a session between states.
#[derive(Debug, Display, Error, From)]
pub enum AuthError {
    /// The provider did not confirm the user's identity.
    #[display("provider rejected the assertion: {_0}")]
    ProviderRejected(ProviderRejection),

    /// The provider confirmed an identifier we can't make sense of.
    #[display("{_0}")]
    MalformedIdentifier(MalformedIdentifierError),

    #[display("{_0}")]
    StoreUnavailable(StoreError),
}

/// Why the provider did not confirm an assertion.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ProviderRejection {
    /// The user cancelled the login on the provider's side.
    #[display("login was cancelled")]
    Cancelled,

    #[display("assertion is malformed")]
    MalformedAssertion,

    /// The assertion was issued for a different relying party.
    #[display("assertion does not return to our host")]
    HostMismatch,

    #[display("provider could not be reached")]
    Unreachable,

    #[display("provider responded with {status}")]
    BadStatus { status: http::StatusCode },

    /// The provider says it did not issue this assertion.
    #[display("provider did not confirm the assertion")]
    NotValid,
}

/// Failed logins are the user's problem, not ours: they're sent back with a failure marker.
/// Only an unreachable store is a server error.
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::ProviderRejected(_) | Self::MalformedIdentifier(_) => {
                Redirect::to(FAILURE_REDIRECT).into_response()
            },
            Self::StoreUnavailable(error) => ErrorResponse::internal_server_error(error).into_response(),
        }
    }
}
