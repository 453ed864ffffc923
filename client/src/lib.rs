//! Client core for the live-monitoring app.
//!
//! Session persistence, authenticated API access, the sign-in flow,
//! push-token provisioning, stream listing and notification popups, with
//! the UI left to the embedding shell.

pub mod app;
pub mod auth;
pub mod config;
pub mod errors;
pub mod http;
pub mod notice;
pub mod notifications;
pub mod push;
pub mod routes;
pub mod session;
pub mod storage;
pub mod streams;
pub mod utils;

pub use app::ClientContext;
pub use config::Config;
pub use errors::{ClientError, ClientResult};
