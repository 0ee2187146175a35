// Service exports
pub mod cache;
pub mod memory;
pub mod postgres;
pub mod store;

pub use cache::{IdentityCache, CacheKey};
pub use memory::MemoryStore;
pub use postgres::PostgresClient;
pub use store::{ProfileStore, EdgeStore, MessageStore, StoreError};
