//! HTTP middleware wrapped around the whole application.
//!
//! Session handling lives in [`crate::session`], since handlers interact with it directly.

pub mod catch_panic;
pub mod request_id;
pub mod trace;
