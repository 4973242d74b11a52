//! HTTP API for triggering migrations and reading migrated data.
//!
//! All routes live under [`API_PREFIX`].

mod server;

pub use server::{API_PREFIX, ApiState, build_router, start_server};
