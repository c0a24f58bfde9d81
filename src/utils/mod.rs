pub mod headers;
pub mod logging;
pub mod responses;
