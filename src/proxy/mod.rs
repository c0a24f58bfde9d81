//! Request-proxying layer
//!
//! Forwards browser requests to the upstream API, keeping the browser's bearer
//! header and normalizing error shapes to JSON.

pub mod forward;

pub use forward::forward_request;
