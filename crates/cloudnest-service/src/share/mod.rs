//! Sharing: grant management, propagation onto descendants, and the
//! grantee-facing operations that run on the owner's behalf.

pub(crate) mod inherit;
pub mod service;
pub mod shared_space;

pub use service::{ShareOutcome, ShareService};
pub use shared_space::SharedSpaceService;
