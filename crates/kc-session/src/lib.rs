//! # kc-session
//!
//! Transaction-scoped authentication sessions for the identity broker.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth_session;

pub use auth_session::AuthenticationSession;
