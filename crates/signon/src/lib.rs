/* Copyright (C) 2024  AlphaKeks <alphakeks@dawn.sh>
 *
 * This library is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This library is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this repository.  If not, see <https://www.gnu.org/licenses/>.
 */

//! A session-backed OpenID 2.0 relying party for Steam.
//!
//! Users start out anonymous. `POST /auth/login` sends them to Steam, Steam sends them back to
//! `GET /auth/return` with a signed assertion, and if Steam confirms that assertion the user's
//! session becomes authenticated. `POST /auth/logout` destroys the session again.
//!
//! Sessions are plain values: the [session middleware] loads one for every request and hands it
//! to the handler, and whatever session the handler returns is written back to the injected
//! [`SessionStore`].
//!
//! [session middleware]: session::manage

#[macro_use]
extern crate derive_more;

#[macro_use(trace, debug, info, info_span, warn, error)]
extern crate tracing;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use url::Url;

pub mod config;
pub use config::Config;

pub mod runtime;
pub mod identity;
pub mod session;
pub use session::{MemoryStore, SessionStore};

pub mod auth;
pub use auth::Authenticator;

pub mod chain;

mod extract;
mod home;
mod middleware;
mod response;
mod views;

#[cfg(test)]
mod testing;

#[derive(Debug, Display, Error, From)]
pub enum Error {
    #[display("failed to initialize runtime: {_0}")]
    #[from(ignore)]
    InitializeRuntime(io::Error),

    #[display("failed to initialize HTTP client: {_0}")]
    InitializeHttpClient(reqwest::Error),

    #[display("{_0}")]
    InitializeProvider(auth::InitializeProviderError),

    #[display("failed to run server: {_0}")]
    #[from(ignore)]
    RunServer(io::Error),
}

/// Builds the application's [`Router`].
///
/// Every route sits behind the [session middleware](session::manage), driven by `manager`.
pub fn router(
    manager: session::Manager,
    authenticator: Authenticator,
    public_url: impl Into<Arc<Url>>,
) -> Router {
    Router::new()
        .merge(home::router())
        .nest("/auth", auth::http::router(authenticator, public_url))
        .layer(axum::middleware::from_fn_with_state(manager, session::manage))
}

/// Run the server.
///
/// This function will initialize its own [`tokio`] runtime and **block** until the server shuts
/// down.
pub fn run(config: Config) -> Result<(), Error> {
    runtime::build(&config.runtime)
        .map_err(Error::InitializeRuntime)?
        .block_on(serve(config))
}

async fn serve(config: Config) -> Result<(), Error> {
    let shutdown_token = CancellationToken::new();
    let tasks = TaskTracker::new();

    let store = Arc::new(MemoryStore::new());
    tasks.spawn(
        Arc::clone(&store).run_sweeper(config.sessions.sweep_interval, shutdown_token.child_token()),
    );

    let http_client = reqwest::Client::builder().build()?;
    let provider = auth::SteamProvider::new(http_client, &config.openid)?;
    let authenticator = Authenticator::new(provider);

    let manager = session::Manager::new(store, config.cookies, config.sessions.anonymous_ttl);

    let app = router(manager, authenticator, config.openid.public_url)
        .layer(middleware::catch_panic::layer())
        .layer(middleware::trace::layer::<axum::body::Body, axum::body::Body>())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(middleware::request_id::make_request_id()))
        .into_make_service_with_connect_info::<SocketAddr>();

    let socket = tokio::net::TcpListener::bind(config.server.socket_addr())
        .await
        .map_err(Error::RunServer)?;

    let addr = socket.local_addr().map_err(Error::RunServer)?;

    info!("Listening on {addr}");

    let serve_result = axum::serve(socket, app)
        .with_graceful_shutdown(runtime::signal::shutdown())
        .await;

    tasks.close();
    shutdown_token.cancel();

    if tokio::time::timeout(Duration::from_secs(15), tasks.wait())
        .await
        .is_err()
    {
        warn!("background tasks did not shut down within timeout");
    }

    serve_result.map_err(Error::RunServer)
}
