//! # kc-storage
//!
//! Storage abstraction for the local identity store.
//!
//! ## Provider Traits
//!
//! - [`GroupProvider`] - group hierarchy and user membership
//!
//! [`InMemoryGroupProvider`] is a process-local implementation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod group;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use group::GroupProvider;
pub use memory::{InMemoryGroupProvider, MembershipChange};
