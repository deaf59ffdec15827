//! Application layer - organized by Clean Architecture principles.
//!
//! # Structure
//!
//! - `domain/` - Core data structures (Document, History, Settings, Messages)
//! - `controllers/` - Orchestration (generation state, preview scheduling, session)
//! - `services/` - I/O-facing operations (rendering API, config, storage)
//! - `infrastructure/` - Errors and platform integration
//! - `runtime.rs` - Executes controller effects on worker threads

pub mod controllers;
pub mod domain;
pub mod infrastructure;
pub mod runtime;
pub mod services;

// Re-exports for convenient external access
pub use controllers::generation::SessionState;
pub use controllers::session::{Effect, SessionController, TransferJob};
pub use domain::{Document, FontChoice, Message, Settings, SettingsPatch};
pub use infrastructure::error::{AppError, Result};
pub use infrastructure::platform::detect_system_dark_mode;
pub use runtime::{EventSink, Executor, Flow};
pub use services::api::{HttpRenderService, RenderService};
pub use services::config::ClientConfig;
pub use services::storage::{FileStorage, MemoryStorage, Storage};
