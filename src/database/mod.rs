pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod stores;

pub use manager::{with_timeout, DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use stores::{ApiKeyStore, StoreHealth, Stores, UserStore, WalletStore};
