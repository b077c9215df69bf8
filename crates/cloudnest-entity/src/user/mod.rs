//! User entity and quota value object.

pub mod model;
pub mod quota;
pub mod role;

pub use model::{CreateUser, User};
pub use quota::QuotaInfo;
pub use role::UserRole;
