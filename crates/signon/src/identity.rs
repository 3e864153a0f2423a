//! User identities asserted by the OpenID provider.
//!
//! A [`UserIdentity`] is fully determined by the provider's claimed identifier: the numeric id is
//! the identifier's last path segment. Steam claimed identifiers look like
//! `https://steamcommunity.com/openid/id/76561197975696140`.

use std::fmt;

use url::Url;

/// A user whose identity has been confirmed by the provider.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct UserIdentity {
    #[debug("{:?}", claimed_id.as_str())]
    claimed_id: Url,
    numeric_id: NumericId,
}

/// The provider-specific numeric user id (a SteamID64, for Steam).
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumericId(u64);

#[derive(Debug, Display, Error, PartialEq, Eq)]
#[display("malformed claimed identifier `{identifier}`: {reason}")]
pub struct MalformedIdentifierError {
    identifier: String,
    reason: MalformedReason,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    #[display("not an absolute URL")]
    NotAUrl,

    #[display("no numeric suffix")]
    MissingNumericSuffix,

    #[display("numeric suffix does not fit into 64 bits")]
    NumericSuffixOutOfRange,
}

impl UserIdentity {
    /// Derives an identity from the claimed identifier returned by the provider.
    pub fn from_claimed_id(claimed_id: Url) -> Result<Self, MalformedIdentifierError> {
        let malformed = |reason| MalformedIdentifierError {
            identifier: claimed_id.as_str().to_owned(),
            reason,
        };

        let suffix = claimed_id
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()))
            .ok_or_else(|| malformed(MalformedReason::MissingNumericSuffix))?;

        let numeric_id = suffix
            .parse::<u64>()
            .map(NumericId)
            .map_err(|_| malformed(MalformedReason::NumericSuffixOutOfRange))?;

        Ok(Self { claimed_id, numeric_id })
    }

    pub fn claimed_id(&self) -> &Url {
        &self.claimed_id
    }

    pub fn numeric_id(&self) -> NumericId {
        self.numeric_id
    }
}

impl NumericId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// JavaScript can't represent every SteamID64 as a number, so these go over the wire as strings.
impl serde::Serialize for NumericId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

impl MalformedIdentifierError {
    pub fn reason(&self) -> MalformedReason {
        self.reason
    }
}

/// Returns the durable form of `user`, as stored in the session.
///
/// This is the claimed identifier, verbatim.
pub fn serialize_identity(user: &UserIdentity) -> String {
    user.claimed_id.as_str().to_owned()
}

/// Rebuilds a [`UserIdentity`] from the output of [`serialize_identity()`].
pub fn deserialize_identity(key: &str) -> Result<UserIdentity, MalformedIdentifierError> {
    let claimed_id = Url::parse(key).map_err(|_| MalformedIdentifierError {
        identifier: key.to_owned(),
        reason: MalformedReason::NotAUrl,
    })?;

    UserIdentity::from_claimed_id(claimed_id)
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{} ({})", self.numeric_id, self.claimed_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn extracts_numeric_suffix() -> color_eyre::Result<()> {
        let user = deserialize_identity("http://provider.example/openid/id/76561197975696140")?;

        testing::assert_eq!(user.numeric_id().get(), 76561197975696140);

        Ok(())
    }

    #[test]
    fn rejects_missing_suffix() -> color_eyre::Result<()> {
        let error = deserialize_identity("http://provider.example/openid/id/").unwrap_err();

        testing::assert_eq!(error.reason(), MalformedReason::MissingNumericSuffix);

        Ok(())
    }

    #[test]
    fn rejects_non_numeric_suffix() -> color_eyre::Result<()> {
        for key in [
            "http://provider.example/openid/id/alphakeks",
            "http://provider.example/openid/id/7656119797569614O",
            "http://provider.example/openid/id/+123",
            "http://provider.example",
        ] {
            let error = deserialize_identity(key).unwrap_err();
            testing::assert_eq!(error.reason(), MalformedReason::MissingNumericSuffix);
        }

        Ok(())
    }

    #[test]
    fn rejects_suffix_out_of_range() -> color_eyre::Result<()> {
        let error =
            deserialize_identity("http://provider.example/openid/id/18446744073709551616").unwrap_err();

        testing::assert_eq!(error.reason(), MalformedReason::NumericSuffixOutOfRange);

        Ok(())
    }

    #[test]
    fn rejects_relative_identifiers() -> color_eyre::Result<()> {
        let error = deserialize_identity("/openid/id/76561197975696140").unwrap_err();

        testing::assert_eq!(error.reason(), MalformedReason::NotAUrl);

        Ok(())
    }

    #[test]
    fn serialization_round_trips() -> color_eyre::Result<()> {
        for claimed_id in [
            "https://steamcommunity.com/openid/id/76561197975696140",
            "http://provider.example/openid/id/0",
            "http://provider.example/a/b/c/18446744073709551615",
        ] {
            let user = UserIdentity::from_claimed_id(Url::parse(claimed_id)?)?;
            let restored = deserialize_identity(&serialize_identity(&user))?;

            testing::assert_eq!(restored.numeric_id(), user.numeric_id());
            testing::assert_eq!(restored, user);
        }

        Ok(())
    }

    #[test]
    fn numeric_id_serializes_as_string() -> color_eyre::Result<()> {
        let user = deserialize_identity("https://steamcommunity.com/openid/id/76561197975696140")?;
        let json = serde_json::to_value(&user)?;

        testing::assert_eq!(
            json,
            serde_json::json!({
                "claimed_id": "https://steamcommunity.com/openid/id/76561197975696140",
                "numeric_id": "76561197975696140",
            })
        );

        Ok(())
    }
}
