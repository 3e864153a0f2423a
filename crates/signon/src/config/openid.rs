use url::Url;

#[derive(Debug, serde::Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct OpenIdConfig {
    /// The provider's OpenID 2.0 endpoint.
    #[debug("{:?}", provider_url.as_str())]
    #[serde(default = "default_provider_url")]
    pub provider_url: Url,

    /// The URL under which this server is reachable by users.
    ///
    /// This must be an origin (no path); the provider sends users back to `/auth/return` on
    /// it, and only assertions returning to this host are accepted.
    #[debug("{:?}", public_url.as_str())]
    #[serde(default = "default_public_url")]
    pub public_url: Url,

    /// The OpenID realm users are asked to trust.
    ///
    /// Defaults to the origin of [`public_url`](Self::public_url).
    #[debug("{:?}", realm.as_ref().map(Url::as_str))]
    pub realm: Option<Url>,
}

impl Default for OpenIdConfig {
    fn default() -> Self {
        Self {
            provider_url: default_provider_url(),
            public_url: default_public_url(),
            realm: None,
        }
    }
}

fn default_provider_url() -> Url {
    Url::parse(steam_openid::LOGIN_URL).expect("hard-coded URL should be valid")
}

fn default_public_url() -> Url {
    Url::parse("http://localhost:3000").expect("hard-coded URL should be valid")
}
