//! Status lifecycle and the unified file/folder view.

pub mod model;
pub mod status;

pub use model::{Item, ItemInfo};
pub use status::ItemStatus;
