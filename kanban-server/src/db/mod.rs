//! Database layer - connection pool, migrations and repositories
//!
//! # Design Principles
//!
//! - Connection pool with an explicit limit - no Arc<Mutex<Connection>>
//! - Embedded profiles use JOINs - no N+1 queries
//! - Rely on DB constraints, handle conflicts - no check-then-insert
//! - Transactions for multi-step operations (board creation, position writes)

pub mod migrations;
pub mod pool;
pub mod repos;
pub mod store;

pub use pool::{connect, create_pool};
pub use store::PgStore;
