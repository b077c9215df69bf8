//! File entity.

pub mod model;

pub use model::{DEFAULT_MIME_TYPE, File, NewFile};
