//! Repositorios
//!
//! Implementaciones del `Store` que consume el motor: en memoria (con
//! snapshot JSON opcional) y PostgreSQL.

pub mod memory_store;
pub mod postgres_store;
pub mod seed;
pub mod store;

pub use memory_store::{Dataset, InMemoryStore};
pub use postgres_store::PgStore;
pub use store::{RouteGuard, Store, StoreBatch, VersionedOrder};
