//! Helpers for tests.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::Router;
use color_eyre::eyre::{bail, eyre};
use cookie::Cookie;
use futures_util::future::{self, BoxFuture};
use url::Url;

use crate::auth::{Assertion, Authenticator, IdentityProvider, ProviderRejection};
use crate::config::CookieConfig;
use crate::session::{Manager, MemoryStore, SessionKey, SessionStore, StoreError, COOKIE_NAME};

pub const FAKE_LOGIN_URL: &str = "https://provider.example/openid/login";

/// Global constructor that will run before tests.
#[ctor::ctor]
fn setup() {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    color_eyre::install().expect("failed to install color-eyre");

    tracing_subscriber::fmt()
        .compact()
        .with_file(true)
        .with_level(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_target(true)
        .with_test_writer()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

macro_rules! assert {
    ($expr:expr $(,)?) => {
        ::color_eyre::eyre::ensure!($expr, "assertion failed: `{}`", stringify!($expr))
    };
    ($expr:expr, $($msg:tt)+) => {
        ::color_eyre::eyre::ensure!($expr, $($msg)+)
    };
}

macro_rules! assert_eq {
    ($lhs:expr, $rhs:expr $(,)?) => {
        match (&$lhs, &$rhs) {
            (lhs, rhs) => {
                if *lhs != *rhs {
                    ::color_eyre::eyre::bail!(
                        "assertion `{} == {}` failed\n  lhs: {:?}\n  rhs: {:?}",
                        stringify!($lhs),
                        stringify!($rhs),
                        lhs,
                        rhs,
                    );
                }
            },
        }
    };
    ($lhs:expr, $rhs:expr, $($msg:tt)+) => {
        match (&$lhs, &$rhs) {
            (lhs, rhs) => {
                if *lhs != *rhs {
                    ::color_eyre::eyre::bail!(
                        "assertion `{} == {}` failed: {}\n  lhs: {:?}\n  rhs: {:?}",
                        stringify!($lhs),
                        stringify!($rhs),
                        format_args!($($msg)+),
                        lhs,
                        rhs,
                    );
                }
            },
        }
    };
}

macro_rules! assert_matches {
    ($expr:expr, $pat:pat $(if $cond:expr)? $(,)?) => {
        match $expr {
            $pat $(if $cond)? => {},
            ref value => ::color_eyre::eyre::bail!(
                "assertion failed: `{:?}` does not match `{}`",
                value,
                stringify!($pat),
            ),
        }
    };
}

pub(crate) use {assert, assert_eq, assert_matches};

/// An [`IdentityProvider`] that decides based on the assertion alone.
///
/// Assertions built by [`FakeProvider::accepted()`] are confirmed, everything else is rejected.
#[derive(Debug)]
pub struct FakeProvider {
    login_url: Url,
}

impl FakeProvider {
    pub fn new() -> color_eyre::Result<Self> {
        Ok(Self { login_url: Url::parse(FAKE_LOGIN_URL)? })
    }

    /// An assertion the provider will confirm for `claimed_id`.
    pub fn accepted(claimed_id: &str) -> Assertion {
        Self::assertion(claimed_id, "valid")
    }

    /// An assertion the provider did not issue.
    pub fn rejected() -> Assertion {
        Self::assertion("https://steamcommunity.com/openid/id/76561197975696140", "forged")
    }

    fn assertion(claimed_id: &str, sig: &str) -> Assertion {
        let query = serde_html_form::to_string([
            ("openid.mode", "id_res"),
            ("openid.claimed_id", claimed_id),
            ("openid.sig", sig),
        ])
        .expect("assertion should serialize");

        Assertion::new(query)
    }
}

impl IdentityProvider for FakeProvider {
    fn login_url(&self) -> &Url {
        &self.login_url
    }

    fn verify<'a>(&'a self, assertion: &'a Assertion) -> BoxFuture<'a, Result<Url, ProviderRejection>> {
        let result = serde_html_form::from_str::<HashMap<String, String>>(assertion.as_str())
            .map_err(|_| ProviderRejection::MalformedAssertion)
            .and_then(|fields| match fields.get("openid.sig").map(String::as_str) {
                Some("valid") => fields
                    .get("openid.claimed_id")
                    .and_then(|claimed_id| Url::parse(claimed_id).ok())
                    .ok_or(ProviderRejection::MalformedAssertion),
                _ => Err(ProviderRejection::NotValid),
            });

        Box::pin(future::ready(result))
    }
}

/// A [`SessionStore`] that fails some or all operations.
#[derive(Debug)]
pub struct FailingStore {
    reads_fail: bool,
    writes_fail: bool,
}

impl FailingStore {
    pub fn everything() -> Self {
        Self { reads_fail: true, writes_fail: true }
    }

    /// Reads find nothing and deletes fail; only saving works.
    pub fn deletes_only() -> Self {
        Self { reads_fail: false, writes_fail: false }
    }

    /// Reads find nothing; saving and deleting fail.
    pub fn writes_fail() -> Self {
        Self { reads_fail: false, writes_fail: true }
    }

    fn fail_if<T>(failing: bool, ok: T) -> Result<T, StoreError> {
        if failing {
            Err(StoreError::new("connection refused"))
        } else {
            Ok(ok)
        }
    }
}

impl SessionStore for FailingStore {
    fn get(&self, _: SessionKey) -> BoxFuture<'_, Result<Option<String>, StoreError>> {
        Box::pin(future::ready(Self::fail_if(self.reads_fail, None)))
    }

    fn set(&self, _: SessionKey, _: String, _: time::Duration) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(future::ready(Self::fail_if(self.writes_fail, ())))
    }

    fn delete(&self, _: SessionKey) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(future::ready(Self::fail_if(true, ())))
    }
}

/// The full application router, backed by a [`MemoryStore`] and a [`FakeProvider`].
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> color_eyre::Result<Self> {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<MemoryStore>) -> color_eyre::Result<Self> {
        let manager = Manager::new(
            Arc::clone(&store) as Arc<dyn SessionStore>,
            CookieConfig::default(),
            time::Duration::hours(1),
        );

        let router = crate::router(
            manager,
            Authenticator::new(FakeProvider::new()?),
            Url::parse("http://localhost:3000")?,
        );

        Ok(Self { router, store })
    }

    /// Stores an anonymous session and returns its key.
    pub async fn anonymous_session(&self) -> color_eyre::Result<SessionKey> {
        self.session_with(serde_json::json!({ "identity": null })).await
    }

    /// Stores a session logged in as `claimed_id` and returns its key.
    pub async fn authenticated_session(&self, claimed_id: &str) -> color_eyre::Result<SessionKey> {
        self.session_with(serde_json::json!({ "identity": claimed_id })).await
    }

    async fn session_with(&self, data: serde_json::Value) -> color_eyre::Result<SessionKey> {
        let key = SessionKey::new();

        self.store
            .set(key, data.to_string(), time::Duration::hours(1))
            .await?;

        Ok(key)
    }
}

/// A `GET` request, optionally carrying a session cookie.
pub fn request(uri: &str, session: Option<SessionKey>) -> color_eyre::Result<http::Request<Body>> {
    let mut request = http::Request::get(uri);

    if let Some(key) = session {
        request = request.header(http::header::COOKIE, format!("{COOKIE_NAME}={key}"));
    }

    Ok(request.body(Body::empty())?)
}

/// The session cookie set by `response`.
pub fn session_cookie<B>(response: &http::Response<B>) -> color_eyre::Result<Cookie<'static>> {
    for header in response.headers().get_all(http::header::SET_COOKIE) {
        let cookie = Cookie::parse(header.to_str()?.to_owned())?;

        if cookie.name() == COOKIE_NAME {
            return Ok(cookie);
        }
    }

    bail!("response did not set a session cookie")
}

pub async fn body_text(response: http::Response<Body>) -> color_eyre::Result<String> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;

    String::from_utf8(bytes.to_vec()).map_err(|error| eyre!("response body is not UTF-8: {error}"))
}

/// A Steam-shaped `id_res` query string.
pub fn assertion(claimed_id: &str, return_to: &str, sig: &str) -> color_eyre::Result<String> {
    Ok(serde_html_form::to_string([
        ("openid.ns", "http://specs.openid.net/auth/2.0"),
        ("openid.mode", "id_res"),
        ("openid.op_endpoint", steam_openid::LOGIN_URL),
        ("openid.claimed_id", claimed_id),
        ("openid.identity", claimed_id),
        ("openid.return_to", return_to),
        ("openid.response_nonce", "2024-11-26T12:00:00Zabcdef"),
        ("openid.assoc_handle", "1234567890"),
        ("openid.signed", "signed,op_endpoint,claimed_id,identity,return_to"),
        ("openid.sig", sig),
    ])?)
}
