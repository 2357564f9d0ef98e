//! SQLite backend for the Missive messaging store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. Every mutation runs in a single
//! SQLite transaction together with the effects emitted by the registered
//! propagation hooks, so the primary write and its derived state commit or
//! roll back as one.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
