use std::num::NonZeroUsize;

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RuntimeConfig {
    /// How many worker threads the runtime should spawn.
    ///
    /// Defaults to the number of CPU cores.
    #[serde(deserialize_with = "deserialize_non_zero")]
    pub worker_threads: Option<NonZeroUsize>,

    #[serde(deserialize_with = "deserialize_non_zero")]
    pub max_blocking_threads: Option<NonZeroUsize>,
}

/// `0` means "unset".
fn deserialize_non_zero<'de, D>(deserializer: D) -> Result<Option<NonZeroUsize>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(<Option<usize> as serde::Deserialize<'de>>::deserialize(deserializer)?
        .and_then(NonZeroUsize::new))
}
