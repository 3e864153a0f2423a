use serde::ser::{Serialize, SerializeMap, Serializer};
use url::{Position, Url};

const OPENID_NS: &str = "http://specs.openid.net/auth/2.0";
const IDENTIFIER_SELECT: &str = "http://specs.openid.net/auth/2.0/identifier_select";

/// Constructs a URL for OpenID 2.0 login with Steam.
///
/// `provider` is the OpenID endpoint the user is sent to (usually [`LOGIN_URL`]). Steam will
/// redirect the user to `return_to` after the login process is complete. If no `realm` is
/// given, the origin of `return_to` is used.
///
/// [`LOGIN_URL`]: crate::LOGIN_URL
#[tracing::instrument(
    level = "trace",
    skip_all,
    fields(provider = provider.as_str(), return_to = return_to.as_str()),
    ret(Display, level = "debug"),
    err(level = "debug"),
)]
pub fn login_url(
    provider: &Url,
    return_to: &Url,
    realm: Option<&Url>,
) -> Result<Url, serde_urlencoded::ser::Error> {
    let realm = match realm {
        Some(realm) => realm.as_str(),
        None => &return_to[..Position::BeforePath],
    };

    let query_string = serde_urlencoded::to_string(&Form { return_to, realm })?;
    let mut url = provider.clone();

    url.set_query(Some(&query_string));

    Ok(url)
}

struct Form<'a> {
    return_to: &'a Url,
    realm: &'a str,
}

impl Serialize for Form<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut serializer = serializer.serialize_map(Some(6))?;

        serializer.serialize_entry("openid.ns", OPENID_NS)?;
        serializer.serialize_entry("openid.mode", "checkid_setup")?;

        for key in ["openid.identity", "openid.claimed_id"] {
            serializer.serialize_entry(key, IDENTIFIER_SELECT)?;
        }

        serializer.serialize_entry("openid.realm", self.realm)?;
        serializer.serialize_entry("openid.return_to", self.return_to.as_str())?;

        serializer.end()
    }
}
