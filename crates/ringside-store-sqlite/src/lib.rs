//! SQLite backend for the Ringside roster engine.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Each mutation is one `IMMEDIATE`
//! transaction that reads the entity's history, plans the operation in
//! `ringside-core`, and writes the resulting rows.

mod encode;
mod filter;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
