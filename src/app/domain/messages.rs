use std::path::PathBuf;

use super::settings::SettingsPatch;
use crate::app::infrastructure::error::AppError;
use crate::app::services::api::{ArtifactId, ExportFormat, PreviewLine};

/// Everything the session controller reacts to: user actions, timer expiries
/// and results coming back from worker threads. Messages are handled one at a
/// time in arrival order.
#[derive(Debug)]
pub enum Message {
    // Document
    TextEdited(String),
    Undo,
    Redo,
    LoadTemplate(String),
    ImportFile(PathBuf),
    AutoStructure,

    // Settings
    UpdateSettings(SettingsPatch),
    ApplyPreset(String),
    ResetSettings,
    SetSignature(PathBuf),
    ClearSignature,
    ToggleDarkMode,

    // Generation
    Generate,
    StartNew,
    Download,
    Export(ExportFormat),
    OpenArtifact,

    // Timers
    PreviewTimer(u64),
    GenerateTimeout(u64),

    // Worker results
    FontsLoaded(Result<Vec<String>, AppError>),
    PreviewLoaded {
        seq: u64,
        result: Result<Vec<PreviewLine>, AppError>,
    },
    GenerateFinished {
        ticket: u64,
        result: Result<ArtifactId, AppError>,
    },
    TransferFinished(Result<PathBuf, AppError>),
    AutoStructured {
        source: String,
        result: Result<String, AppError>,
    },

    Quit,
}
