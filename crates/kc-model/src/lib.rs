//! # kc-model
//!
//! Domain models shared by the broker mappers: users and hierarchical groups.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod group;
pub mod user;

pub use group::{Group, GroupPath};
pub use user::User;
