//! Share grants.

pub mod model;
pub mod permission;

pub use model::{ShareGrant, SharedItem};
pub use permission::SharePermission;
