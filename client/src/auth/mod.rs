//! Authentication lifecycle for the client.
//!
//! This module provides login with an optional second factor, logout, and
//! the token inspection helpers the session store relies on.

pub mod models;
pub mod service;
pub mod token;

pub use service::{AuthController, AuthOutcome, AuthState};
