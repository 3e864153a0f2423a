use axum::extract::FromRequestParts;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

mod rejection;
pub use rejection::QueryRejection;

/// An [extractor] for URI query parameters.
///
/// Unlike [`axum::extract::Query`], this uses [`serde_html_form`], so flags without a value
/// (`/?failed`) and repeated keys deserialize the way browsers send them.
///
/// [extractor]: axum::extract
#[derive(Debug)]
pub struct Query<T>(pub T)
where
    T: for<'de> Deserialize<'de>;

impl<S, T> FromRequestParts<S> for Query<T>
where
    S: Send + Sync,
    T: for<'de> Deserialize<'de>,
{
    type Rejection = QueryRejection<T>;

    #[tracing::instrument(level = "trace", skip_all, err(level = "debug"))]
    async fn from_request_parts(
        request: &mut http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let query = request.uri.query().unwrap_or_default();

        serde_html_form::from_str(query)
            .map(Self)
            .map_err(QueryRejection::new)
    }
}

/// Deserializes a query parameter that only matters by its presence, like `?failed`.
///
/// Use together with `#[serde(default)]`, so a missing parameter becomes `false`.
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    IgnoredAny::deserialize(deserializer).map(|_| true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[derive(Debug, Deserialize)]
    struct Flags {
        #[serde(default, deserialize_with = "flag")]
        failed: bool,
        id: Option<u64>,
    }

    async fn extract(uri: &str) -> color_eyre::Result<Query<Flags>> {
        let (mut parts, ()) = http::Request::get(uri).body(())?.into_parts();

        Ok(Query::<Flags>::from_request_parts(&mut parts, &()).await?)
    }

    #[tokio::test]
    async fn bare_flag_is_present() -> color_eyre::Result<()> {
        let Query(flags) = extract("/?failed").await?;

        testing::assert!(flags.failed);

        Ok(())
    }

    #[tokio::test]
    async fn missing_query_is_empty() -> color_eyre::Result<()> {
        let Query(flags) = extract("/").await?;

        testing::assert!(!flags.failed);
        testing::assert!(flags.id.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn flag_with_value_is_present() -> color_eyre::Result<()> {
        let Query(flags) = extract("/?id=76561197975696140&failed=1").await?;

        testing::assert!(flags.failed);
        testing::assert_eq!(flags.id, Some(76561197975696140));

        Ok(())
    }

    #[tokio::test]
    async fn invalid_values_are_rejected() -> color_eyre::Result<()> {
        testing::assert!(extract("/?id=steam").await.is_err());

        Ok(())
    }
}
