//! Core type definitions used across the CloudNest workspace.

pub mod id;
pub mod path;

pub use id::*;
