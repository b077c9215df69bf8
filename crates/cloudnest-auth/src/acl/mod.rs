//! Item-level access resolution.

pub mod gate;

pub use gate::{Access, AccessDecision, AccessGate};
