use std::str::FromStr;

use ulid::Ulid;

/// The opaque token carried in the session cookie.
///
/// Keys are [ULID]s: 80 of their 128 bits are random, so they can't be guessed from one another.
///
/// [ULID]: ulid::Ulid
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey(Ulid);

impl SessionKey {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

#[derive(Debug, Display, Error, From)]
#[display("failed to parse session key: {_0}")]
pub struct ParseSessionKeyError(ulid::DecodeError);

impl FromStr for SessionKey {
    type Err = ParseSessionKeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.parse::<Ulid>().map(Self).map_err(ParseSessionKeyError)
    }
}
