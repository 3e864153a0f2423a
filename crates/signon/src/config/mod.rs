//! Runtime configuration.
//!
//! The binary reads a TOML file into [`Config`]; every section and every field has a default, so
//! an empty file (or no file at all) is a valid configuration for local development.

mod server;
pub use server::ServerConfig;

pub mod tracing;
pub use tracing::TracingConfig;

mod runtime;
pub use runtime::RuntimeConfig;

mod cookies;
pub use cookies::CookieConfig;

mod openid;
pub use openid::OpenIdConfig;

mod sessions;
pub use sessions::SessionsConfig;

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Configuration for the HTTP server.
    pub server: ServerConfig,

    /// Configuration for [`tracing-subscriber`].
    pub tracing: TracingConfig,

    /// Configuration for Tokio.
    pub runtime: RuntimeConfig,

    /// Values for the session cookie's fields.
    pub cookies: CookieConfig,

    /// Where to send users for login, and where they come back to.
    pub openid: OpenIdConfig,

    /// Session lifetimes and cleanup.
    pub sessions: SessionsConfig,
}
