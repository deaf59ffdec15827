//! Controllers layer - orchestration and coordination.
//!
//! - Generation state machine
//! - Preview debouncing and ordering
//! - The session controller that ties everything together

pub mod generation;
pub mod preview;
pub mod session;
