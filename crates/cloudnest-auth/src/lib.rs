//! # cloudnest-auth
//!
//! Access control for CloudNest. The [`acl::AccessGate`] decides what a
//! requesting user may do with an item before the namespace engine acts on
//! the owner's behalf. Identity issuance lives outside this workspace; the
//! gate only consumes resolved user IDs.

pub mod acl;

pub use acl::{Access, AccessDecision, AccessGate};
