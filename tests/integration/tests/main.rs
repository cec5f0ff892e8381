//! End-to-end tests of the Graph API mappers.
//!
//! These tests drive the mappers through a real HTTP client against a
//! wiremock directory.

mod attribute_mappers;
mod group_mappers;
