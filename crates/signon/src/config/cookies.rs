use std::borrow::Cow;

use cookie::{Cookie, CookieBuilder, SameSite};

use crate::runtime;

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CookieConfig {
    /// The value for the [`Domain`] field.
    ///
    /// If this is not set, the cookie is only sent back to the exact host that set it.
    ///
    /// [`Domain`]: https://developer.mozilla.org/en-US/docs/Web/HTTP/Headers/Set-Cookie#domaindomain-value
    pub domain: Option<String>,

    /// The value for the [`Max-Age`] field (in seconds).
    ///
    /// This is also how long sessions live in the session store.
    ///
    /// [`Max-Age`]: https://developer.mozilla.org/en-US/docs/Web/HTTP/Headers/Set-Cookie#max-agenumber
    #[serde(default = "default_max_age", deserialize_with = "super::sessions::deserialize_ttl")]
    pub max_age: time::Duration,
}

impl CookieConfig {
    /// Starts building a cookie with our defaults.
    ///
    /// The cookie is `HttpOnly` and `SameSite=Lax`, and only `Secure` in production.
    /// `Strict` would drop the cookie on the redirect back from the provider.
    pub fn build_cookie<'a>(
        &self,
        name: impl Into<Cow<'a, str>>,
        value: impl Into<Cow<'a, str>>,
    ) -> CookieBuilder<'a> {
        let mut builder = Cookie::build((name, value))
            .http_only(true)
            .max_age(self.max_age)
            .path("/")
            .same_site(SameSite::Lax)
            .secure(runtime::environment().is_production());

        if let Some(ref domain) = self.domain {
            builder = builder.domain(domain.clone());
        }

        builder
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self { domain: None, max_age: default_max_age() }
    }
}

fn default_max_age() -> time::Duration {
    time::Duration::weeks(2)
}
