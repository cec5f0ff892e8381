//! # kc-federation
//!
//! Identity-broker mapper framework.
//!
//! This crate provides the pieces every broker mapper builds on:
//!
//! - [`mapper`]: mapper traits, outcomes and the per-login runner
//! - [`config`]: mapper configuration, including map-typed entries
//! - [`attribute`]: the attribute write primitive
//! - [`normalize`]: group-name normalisation
//! - [`sync`]: managed group membership reconciliation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod attribute;
pub mod config;
pub mod error;
pub mod mapper;
pub mod normalize;
pub mod sync;

pub use attribute::{apply_attribute, AttributeValue};
pub use config::{MapperConfig, SyncMode};
pub use error::{FederationError, FederationResult};
pub use mapper::{
    run_mappers, BrokerContext, BrokerEvent, ConfigProperty, ConfigPropertyKind,
    FederationMapper, IdentityProviderMapper, MapperOutcome, MapperRun, SkipReason,
};
pub use normalize::GroupNameNormalizer;
pub use sync::{
    GroupReconciler, GroupTree, ManagedGroup, ManagedGroupMapping, ReconciliationPlan,
    SyncError, SyncResult,
};
