//! # cloudnest-core
//!
//! Core crate for CloudNest. Contains the storage provider trait,
//! configuration schemas, typed identifiers, logical-path helpers,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other CloudNest crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
