//! kanban-server: HTTP API for kanban boards
//!
//! Boards with ordered columns and cards, board membership and roles, card
//! comments and a per-board activity feed. Storage sits behind
//! [`store::KanbanStore`] with PostgreSQL ([`db::PgStore`]) and in-memory
//! ([`store::MemoryStore`]) implementations.

pub mod config;
pub mod db;
pub mod http;
pub mod reorder;
pub mod sessions;
pub mod state;
pub mod store;

pub use config::{ConfigError, ServerConfig};
pub use db::PgStore;
pub use http::{build_router, run_server, ApiError, ServerError};
pub use state::AppState;
pub use store::{DbError, KanbanStore, MemoryStore};
