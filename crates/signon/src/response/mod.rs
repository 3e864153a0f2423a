//! Custom [responses].
//!
//! [responses]: axum::response

mod error;
pub use error::ErrorResponse;
