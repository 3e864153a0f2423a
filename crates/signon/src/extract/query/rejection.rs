use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::response::ErrorResponse;
use crate::runtime;

/// Rejection for the [`Query`](super::Query) extractor.
pub struct QueryRejection<T> {
    source: serde_html_form::de::Error,
    _marker: PhantomData<fn() -> T>,
}

impl<T> QueryRejection<T>
where
    T: for<'de> Deserialize<'de>,
{
    pub(super) fn new(source: serde_html_form::de::Error) -> Self {
        Self { source, _marker: PhantomData }
    }
}

impl<T> fmt::Debug for QueryRejection<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_tuple("QueryRejection")
            .field(&self.source)
            .finish()
    }
}

impl<T> fmt::Display for QueryRejection<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "failed to deserialize query string")?;

        if !runtime::environment().is_production() {
            write!(fmt, " of type `{}`", type_name::<T>())?;
        }

        write!(fmt, ": {}", self.source)
    }
}

impl<T> std::error::Error for QueryRejection<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl<T> IntoResponse for QueryRejection<T> {
    fn into_response(self) -> Response {
        ErrorResponse::invalid_query_string(self.to_string()).into_response()
    }
}
