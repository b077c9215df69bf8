//! Physical store backends.

pub mod local;
