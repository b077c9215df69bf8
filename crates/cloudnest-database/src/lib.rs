//! # cloudnest-database
//!
//! The metadata store: folder, file, user and share-grant rows keyed by
//! owner and logical path. [`MetadataStore`] hands out transactions
//! ([`MetadataTx`]) that the namespace engine uses for every step.
//!
//! Two implementations are provided: PostgreSQL ([`PgMetadataStore`]) and
//! a process-local store ([`MemoryMetadataStore`]) used by tests and by
//! throwaway CLI sessions.

pub mod connection;
pub mod factory;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod store;

pub use connection::connect;
pub use factory::open_store;
pub use memory::MemoryMetadataStore;
pub use postgres::PgMetadataStore;
pub use store::{MetadataStore, MetadataTx};
