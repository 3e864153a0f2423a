use futures_util::future::BoxFuture;
use steam_openid::{CallbackPayload, VerifyCallbackPayloadError};
use tower::ServiceBuilder;
use url::Url;

use super::ProviderRejection;
use crate::config::OpenIdConfig;

/// The path the provider sends users back to, relative to our public URL.
pub const RETURN_PATH: &str = "/auth/return";

/// An OpenID provider.
///
/// Implementations hold all of their configuration; the rest of the server only ever asks where
/// to send users, and whether an assertion they came back with is genuine.
pub trait IdentityProvider: Send + Sync + 'static {
    /// The URL users are redirected to for login.
    fn login_url(&self) -> &Url;

    /// Asks the provider to confirm `assertion`, returning the claimed identifier on success.
    fn verify<'a>(&'a self, assertion: &'a Assertion) -> BoxFuture<'a, Result<Url, ProviderRejection>>;
}

/// The raw query string the provider attached to the return URL.
///
/// Opaque to everything except the [`IdentityProvider`] that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion(String);

impl Assertion {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Display, Error, From)]
pub enum InitializeProviderError {
    #[display("failed to build return URL: {_0}")]
    ReturnUrl(url::ParseError),

    #[display("public URL `{_0}` has no host")]
    #[from(ignore)]
    #[error(ignore)]
    MissingHost(String),

    #[display("public URL `{_0}` must not have a path")]
    #[from(ignore)]
    #[error(ignore)]
    NotAnOrigin(String),

    #[display("failed to build login URL: {_0}")]
    LoginUrl(serde_urlencoded::ser::Error),
}

/// Steam, talking OpenID 2.0 through [`steam_openid`].
#[derive(Debug, Clone)]
pub struct SteamProvider {
    http_client: reqwest::Client,

    #[debug("{:?}", provider_url.as_str())]
    provider_url: Url,

    #[debug("{:?}", return_to.as_str())]
    return_to: Url,

    #[debug("{:?}", login_url.as_str())]
    login_url: Url,
}

impl SteamProvider {
    /// Validates `config` and precomputes the login URL.
    pub fn new(http_client: reqwest::Client, config: &OpenIdConfig) -> Result<Self, InitializeProviderError> {
        // every route is mounted at the root, so a path prefix would send users nowhere
        if config.public_url.path() != "/" {
            return Err(InitializeProviderError::NotAnOrigin(config.public_url.to_string()));
        }

        let return_to = config.public_url.join(RETURN_PATH)?;

        if return_to.host().is_none() {
            return Err(InitializeProviderError::MissingHost(config.public_url.to_string()));
        }

        let login_url = steam_openid::login_url(&config.provider_url, &return_to, config.realm.as_ref())?;

        Ok(Self {
            http_client,
            provider_url: config.provider_url.clone(),
            return_to,
            login_url,
        })
    }

    #[tracing::instrument(level = "debug", skip_all, err(level = "debug"))]
    async fn verify_payload(&self, assertion: &Assertion) -> Result<Url, ProviderRejection> {
        #[derive(serde::Deserialize)]
        struct Mode {
            #[serde(rename = "openid.mode")]
            mode: Option<String>,
        }

        if let Ok(Mode { mode: Some(mode) }) = serde_html_form::from_str(assertion.as_str()) {
            if mode == "cancel" {
                return Err(ProviderRejection::Cancelled);
            }
        }

        let mut payload = serde_html_form::from_str::<CallbackPayload>(assertion.as_str())
            .map_err(|error| {
                debug!(%error, "failed to parse callback payload");
                ProviderRejection::MalformedAssertion
            })?;

        let expected_host = self.return_to.host().ok_or(ProviderRejection::HostMismatch)?;

        let http_client = ServiceBuilder::new()
            .map_request(|request| reqwest::Request::try_from(request).expect("uri should be valid"))
            .map_response(http::Response::<reqwest::Body>::from)
            .service(&self.http_client);

        payload
            .verify(&self.provider_url, expected_host, http_client)
            .await
            .map_err(|error| match error {
                VerifyCallbackPayloadError::HostMismatch => ProviderRejection::HostMismatch,
                VerifyCallbackPayloadError::HttpClient(error)
                | VerifyCallbackPayloadError::HttpRequest(error) => {
                    warn!(%error, "failed to reach provider");
                    ProviderRejection::Unreachable
                },
                VerifyCallbackPayloadError::BufferResponseBody { error, response } => {
                    warn!(%error, response.status = %response.status, "failed to read provider response");
                    ProviderRejection::Unreachable
                },
                VerifyCallbackPayloadError::BadStatus { response } => {
                    ProviderRejection::BadStatus { status: response.status() }
                },
                VerifyCallbackPayloadError::InvalidPayload { response } => {
                    debug!(response.body = ?response.body(), "provider did not confirm assertion");
                    ProviderRejection::NotValid
                },
            })
    }
}

impl IdentityProvider for SteamProvider {
    fn login_url(&self) -> &Url {
        &self.login_url
    }

    fn verify<'a>(&'a self, assertion: &'a Assertion) -> BoxFuture<'a, Result<Url, ProviderRejection>> {
        Box::pin(self.verify_payload(assertion))
    }
}

#[cfg(test)]
mod tests {
    use axum::routing::post;
    use axum::Router;
    use http::StatusCode;

    use super::*;
    use crate::testing;

    const CLAIMED_ID: &str = "https://steamcommunity.com/openid/id/76561197975696140";

    fn config(public_url: &str) -> color_eyre::Result<OpenIdConfig> {
        Ok(OpenIdConfig {
            public_url: Url::parse(public_url)?,
            ..Default::default()
        })
    }

    /// Serves `check_authentication` requests on a local port, answering with `status` and
    /// `body`. Returns the endpoint's URL.
    async fn fake_steam(status: StatusCode, body: &'static str) -> color_eyre::Result<Url> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = Router::new().route(
            "/openid/login",
            post(move |form: String| async move {
                if form.contains("openid.mode=check_authentication") {
                    (status, body)
                } else {
                    (StatusCode::BAD_REQUEST, "expected check_authentication")
                }
            }),
        );

        tokio::spawn(async move { axum::serve(listener, app).await });

        Ok(Url::parse(&format!("http://{addr}/openid/login"))?)
    }

    fn provider_at(provider_url: Url) -> color_eyre::Result<SteamProvider> {
        let http_client = reqwest::Client::builder().no_proxy().build()?;
        let config = OpenIdConfig {
            provider_url,
            ..config("http://localhost:3000")?
        };

        Ok(SteamProvider::new(http_client, &config)?)
    }

    fn returning_assertion() -> color_eyre::Result<Assertion> {
        Ok(Assertion::new(testing::assertion(
            CLAIMED_ID,
            "http://localhost:3000/auth/return",
            "c2lnbmF0dXJl",
        )?))
    }

    #[test]
    fn login_url_points_at_provider() -> color_eyre::Result<()> {
        let provider = SteamProvider::new(reqwest::Client::new(), &config("https://signon.example.org")?)?;
        let query = provider
            .login_url()
            .query_pairs()
            .into_owned()
            .collect::<std::collections::HashMap<_, _>>();

        testing::assert!(provider.login_url().as_str().starts_with(steam_openid::LOGIN_URL));
        testing::assert_eq!(query["openid.mode"], "checkid_setup");
        testing::assert_eq!(query["openid.return_to"], "https://signon.example.org/auth/return");
        testing::assert_eq!(query["openid.realm"], "https://signon.example.org");

        Ok(())
    }

    #[test]
    fn public_url_must_be_an_origin() -> color_eyre::Result<()> {
        let result = SteamProvider::new(reqwest::Client::new(), &config("https://signon.example.org/app/")?);

        testing::assert_matches!(result, Err(InitializeProviderError::NotAnOrigin(_)));

        Ok(())
    }

    #[tokio::test]
    async fn cancelled_login_is_rejected_without_contacting_provider() -> color_eyre::Result<()> {
        let provider = SteamProvider::new(reqwest::Client::new(), &config("https://signon.example.org")?)?;
        let assertion = Assertion::new("openid.ns=http%3A%2F%2Fspecs.openid.net%2Fauth%2F2.0&openid.mode=cancel");

        testing::assert_eq!(provider.verify(&assertion).await, Err(ProviderRejection::Cancelled));

        Ok(())
    }

    #[tokio::test]
    async fn garbage_is_a_malformed_assertion() -> color_eyre::Result<()> {
        let provider = SteamProvider::new(reqwest::Client::new(), &config("https://signon.example.org")?)?;

        for raw in ["", "foo=bar", "openid.mode=id_res"] {
            testing::assert_eq!(
                provider.verify(&Assertion::new(raw)).await,
                Err(ProviderRejection::MalformedAssertion)
            );
        }

        Ok(())
    }

    #[tokio::test]
    async fn foreign_return_to_is_rejected_without_contacting_provider() -> color_eyre::Result<()> {
        let provider = SteamProvider::new(reqwest::Client::new(), &config("https://signon.example.org")?)?;
        let assertion = Assertion::new(testing::assertion(
            "https://steamcommunity.com/openid/id/76561197975696140",
            "https://evil.example.com/auth/return",
            "c2lnbmF0dXJl",
        )?);

        testing::assert_eq!(provider.verify(&assertion).await, Err(ProviderRejection::HostMismatch));

        Ok(())
    }

    #[tokio::test]
    async fn confirmed_assertion_yields_claimed_id() -> color_eyre::Result<()> {
        let steam = fake_steam(StatusCode::OK, "ns:http://specs.openid.net/auth/2.0\nis_valid:true\n").await?;
        let provider = provider_at(steam)?;
        let claimed_id = provider.verify(&returning_assertion()?).await;

        testing::assert_eq!(claimed_id.as_ref().map(Url::as_str), Ok(CLAIMED_ID));

        Ok(())
    }

    #[tokio::test]
    async fn unconfirmed_assertion_is_not_valid() -> color_eyre::Result<()> {
        let steam = fake_steam(StatusCode::OK, "ns:http://specs.openid.net/auth/2.0\nis_valid:false\n").await?;
        let provider = provider_at(steam)?;

        testing::assert_eq!(
            provider.verify(&returning_assertion()?).await,
            Err(ProviderRejection::NotValid)
        );

        Ok(())
    }

    #[tokio::test]
    async fn error_status_is_reported() -> color_eyre::Result<()> {
        let steam = fake_steam(StatusCode::SERVICE_UNAVAILABLE, "is_valid:true\n").await?;
        let provider = provider_at(steam)?;

        testing::assert_eq!(
            provider.verify(&returning_assertion()?).await,
            Err(ProviderRejection::BadStatus { status: StatusCode::SERVICE_UNAVAILABLE })
        );

        Ok(())
    }

    #[tokio::test]
    async fn closed_port_is_unreachable() -> color_eyre::Result<()> {
        let addr = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
            listener.local_addr()?
        };

        let provider = provider_at(Url::parse(&format!("http://{addr}/openid/login"))?)?;

        testing::assert_eq!(
            provider.verify(&returning_assertion()?).await,
            Err(ProviderRejection::Unreachable)
        );

        Ok(())
    }
}
