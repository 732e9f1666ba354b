//! Durable session storage.

mod redb_store;

pub use redb_store::RedbSessionStore;
