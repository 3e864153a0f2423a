//! Custom [extractors].
//!
//! [extractors]: axum::extract

mod query;
pub use query::{flag, Query};
