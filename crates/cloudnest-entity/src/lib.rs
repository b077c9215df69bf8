//! # cloudnest-entity
//!
//! Entity models for CloudNest. Every struct in this crate represents a
//! metadata table row or a value object returned by the namespace engine.
//! Table rows additionally derive `sqlx::FromRow`.

pub mod file;
pub mod folder;
pub mod item;
pub mod share;
pub mod user;
