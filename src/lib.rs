//! keydate-sync library
//!
//! This module exports the core components for testing and integration.

pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod mapping;
pub mod migrate;
pub mod reconcile;
pub mod source;
pub mod types;
