use std::time::Duration;

#[derive(Debug, serde::Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SessionsConfig {
    /// How often expired sessions are removed from the in-memory store (in seconds).
    #[serde(default = "default_sweep_interval", deserialize_with = "deserialize_seconds")]
    pub sweep_interval: Duration,

    /// How long sessions without a logged-in user are kept (in seconds).
    ///
    /// Capped at the cookie's `max-age`. Authenticated sessions always live for `max-age`.
    #[serde(default = "default_anonymous_ttl", deserialize_with = "deserialize_ttl")]
    pub anonymous_ttl: time::Duration,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            sweep_interval: default_sweep_interval(),
            anonymous_ttl: default_anonymous_ttl(),
        }
    }
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(60 * 5)
}

fn default_anonymous_ttl() -> time::Duration {
    time::Duration::hours(1)
}

fn deserialize_seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match <u64 as serde::Deserialize<'de>>::deserialize(deserializer)? {
        0 => Err(serde::de::Error::invalid_value(
            serde::de::Unexpected::Unsigned(0),
            &"a non-zero number of seconds",
        )),
        secs => Ok(Duration::from_secs(secs)),
    }
}

/// Deserializes a strictly positive number of seconds.
pub(super) fn deserialize_ttl<'de, D>(deserializer: D) -> Result<time::Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match <i64 as serde::Deserialize<'de>>::deserialize(deserializer)? {
        secs if secs <= 0 => Err(serde::de::Error::invalid_value(
            serde::de::Unexpected::Signed(secs),
            &"a positive number of seconds",
        )),
        secs => Ok(time::Duration::seconds(secs)),
    }
}
