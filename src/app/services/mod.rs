//! Services layer - I/O-facing operations.
//!
//! - Rendering service client
//! - Client configuration
//! - Key/value storage and the settings store built on it
//! - Starter templates

pub mod api;
pub mod config;
pub mod settings_store;
pub mod storage;
pub mod templates;
