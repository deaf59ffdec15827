//! Infrastructure layer - external integrations and utilities.
//!
//! - Error types
//! - Platform-specific detection

pub mod error;
pub mod platform;
