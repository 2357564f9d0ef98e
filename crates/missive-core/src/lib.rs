//! Core types and trait definitions for the Missive messaging store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod derived;
pub mod error;
pub mod inbox;
pub mod message;
pub mod propagation;
pub mod service;
pub mod store;
pub mod thread;
pub mod user;

pub use error::{Error, Result};
pub use service::Messaging;
