//! User provisioning and quota administration.

pub mod service;

pub use service::UserService;
