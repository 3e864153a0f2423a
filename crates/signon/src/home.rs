//! Pages that show the current session.

use axum::routing::get;
use axum::{Json, Router};

use crate::extract::{flag, Query};
use crate::identity::UserIdentity;
use crate::session::Authenticated;
use crate::views::{Index, Page};

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(index))
        .route("/account", get(account))
}

#[derive(Debug, serde::Deserialize)]
struct IndexQuery {
    /// Set by a failed login.
    #[serde(default, deserialize_with = "flag")]
    failed: bool,
}

#[tracing::instrument(level = "debug", skip(user))]
async fn index(
    user: Option<Authenticated>,
    Query(IndexQuery { failed }): Query<IndexQuery>,
) -> Page<Index> {
    Page(Index { identity: user.map(|Authenticated(identity)| identity), failed })
}

/// The logged-in user's identity as JSON.
async fn account(Authenticated(identity): Authenticated) -> Json<UserIdentity> {
    Json(identity)
}
