//! Session state held by the web client
//!
//! # Modules
//!
//! - [`storage`] - Session-lifetime key/value backends
//! - [`store`] - Bearer token store over a session storage backend
//! - [`redirect`] - Token capture from a full-page redirect's query string

pub mod redirect;
pub mod storage;
pub mod store;

pub use redirect::{BrowserLocation, RedirectTokenCapture, TOKEN_QUERY_PARAMS};
pub use storage::{FileSessionStorage, MemorySessionStorage, SessionStorage, SessionStoreError};
pub use store::{SessionTokenStore, ACCESS_TOKEN_KEY};
