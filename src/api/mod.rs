//! Backend API access and the flows built on it
//!
//! # Modules
//!
//! - [`client`] - JSON client that attaches the session bearer token
//! - [`flow`] - LinkedIn popup flow initiator
//! - [`google`] - Google ID-token exchange

pub mod client;
pub mod flow;
pub mod google;

pub use client::{parse_response, ApiClient, ApiError, RequestOptions};
pub use flow::{AuthFlowError, FlowKind, OAuthFlowInitiator, LINKEDIN_START_PATH};
pub use google::{IdTokenExchange, GOOGLE_AUTH_PATH};
