//! Domain layer - core data structures and types.
//!
//! - Document and its statistics
//! - Undo/redo history
//! - Rendering settings and presets
//! - Message types for the event loop

pub mod document;
pub mod history;
pub mod messages;
pub mod settings;

pub use document::{Document, DocumentStats};
pub use history::History;
pub use messages::Message;
pub use settings::{FontChoice, PageSize, PageStyle, Settings, SettingsPatch, SignatureImage};
