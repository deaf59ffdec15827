use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::generation::{GenerationMachine, SessionState};
use super::preview::{PreviewPane, PreviewScheduler, PreviewStyle};
use crate::app::domain::document::{Document, DocumentStats};
use crate::app::domain::history::History;
use crate::app::domain::messages::Message;
use crate::app::domain::settings::{FontChoice, Settings, SettingsPatch, SignatureImage};
use crate::app::infrastructure::error::{AppError, ErrorKind, Result};
use crate::app::services::api::{ArtifactId, ExportFormat, GenerateRequest, PreviewLine};
use crate::app::services::config::ClientConfig;
use crate::app::services::settings_store::SettingsStore;
use crate::app::services::storage::{Storage, load_display_flag, save_display_flag};
use crate::app::services::templates::find_template;

pub const DOWNLOAD_BASENAME: &str = "handwritten_assignment";

/// A download or export to run in the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferJob {
    Download {
        artifact: ArtifactId,
        dest: PathBuf,
    },
    Export {
        artifact: ArtifactId,
        format: ExportFormat,
        scan: bool,
        dest: PathBuf,
    },
}

/// Side effects requested by the controller. The runtime performs them and
/// reports back with `Message`s.
#[derive(Debug, Clone)]
pub enum Effect {
    FetchFonts,
    ArmPreviewTimer { key: u64, delay: Duration },
    FetchPreview { seq: u64, text: String },
    Generate { ticket: u64, request: GenerateRequest },
    ArmGenerateTimeout { ticket: u64, delay: Duration },
    CancelGenerate { ticket: u64 },
    Transfer(TransferJob),
    AutoStructure { text: String },
    OpenArtifact { artifact: ArtifactId },
    Quit,
}

/// Owns the document, history, settings and generation state. All business
/// rules live here; the UI only forwards `Message`s and reads the accessors.
pub struct SessionController {
    config: ClientConfig,
    document: Document,
    history: History,
    settings: SettingsStore,
    machine: GenerationMachine,
    preview: PreviewScheduler,
    preview_pane: PreviewPane,
    fonts: Vec<FontChoice>,
    transfer_in_flight: bool,
    auto_structure_source: Option<String>,
    status: String,
    dark_mode: bool,
    storage: Arc<dyn Storage>,
}

impl SessionController {
    /// Build a session, restoring settings and the display flag from storage.
    /// `default_dark` is used when no display flag was stored.
    pub fn new(config: ClientConfig, storage: Arc<dyn Storage>, default_dark: bool) -> Self {
        let mut settings = SettingsStore::new(storage.clone());
        settings.restore();
        let dark_mode = load_display_flag(storage.as_ref()).unwrap_or(default_dark);

        Self {
            history: History::new("", config.history_limit),
            preview: PreviewScheduler::new(config.preview_delay()),
            config,
            document: Document::default(),
            settings,
            machine: GenerationMachine::new(),
            preview_pane: PreviewPane::Placeholder,
            fonts: FontChoice::all().to_vec(),
            transfer_in_flight: false,
            auto_structure_source: None,
            status: String::new(),
            dark_mode,
            storage,
        }
    }

    /// Effects to run once at startup: ask the server for its fonts and
    /// preview the seed text immediately.
    pub fn start(&mut self) -> Vec<Effect> {
        let mut effects = vec![Effect::FetchFonts];
        effects.extend(self.request_preview());
        effects
    }

    // --- Accessors for the rendering adapter ---

    pub fn text(&self) -> &str {
        self.document.text()
    }

    pub fn stats(&self) -> DocumentStats {
        self.document.stats()
    }

    pub fn settings(&self) -> &Settings {
        self.settings.get()
    }

    pub fn state(&self) -> &SessionState {
        self.machine.state()
    }

    pub fn artifact(&self) -> Option<&ArtifactId> {
        self.machine.artifact()
    }

    pub fn can_undo(&self) -> bool {
        !self.machine.is_generating() && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        !self.machine.is_generating() && self.history.can_redo()
    }

    pub fn can_generate(&self) -> bool {
        self.machine.can_generate()
    }

    pub fn can_edit(&self) -> bool {
        !self.machine.is_generating()
    }

    pub fn can_transfer(&self) -> bool {
        self.machine.artifact().is_some() && !self.transfer_in_flight
    }

    /// True while the blocking progress indicator should be shown.
    pub fn is_busy(&self) -> bool {
        self.machine.is_generating()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn preview_pane(&self) -> &PreviewPane {
        &self.preview_pane
    }

    /// Fonts offered in the settings panel. The fixed list until the server
    /// reports its own.
    pub fn fonts(&self) -> &[FontChoice] {
        &self.fonts
    }

    pub fn preview_style(&self) -> PreviewStyle {
        PreviewStyle::from_settings(self.settings.get())
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // --- Dispatch ---

    pub fn handle(&mut self, message: Message) -> Vec<Effect> {
        match message {
            Message::TextEdited(text) => self.edit(&text, true),
            Message::Undo => self.undo(),
            Message::Redo => self.redo(),
            Message::LoadTemplate(name) => self.load_template(&name),
            Message::ImportFile(path) => self.import_file(&path),
            Message::AutoStructure => self.auto_structure(),

            Message::UpdateSettings(patch) => self.update_settings(&patch),
            Message::ApplyPreset(name) => self.apply_preset(&name),
            Message::ResetSettings => {
                self.settings.reset_to_defaults();
                self.settings.persist();
                self.status = "Settings restored to defaults.".to_string();
                self.schedule_preview()
            }
            Message::SetSignature(path) => {
                match SignatureImage::from_file(&path) {
                    Ok(signature) => {
                        self.settings.set_signature(signature);
                        self.status = "Signature attached.".to_string();
                    }
                    Err(e) => self.status = e.user_message(),
                }
                Vec::new()
            }
            Message::ClearSignature => {
                self.settings.clear_signature();
                self.status = "Signature removed.".to_string();
                Vec::new()
            }
            Message::ToggleDarkMode => {
                self.dark_mode = !self.dark_mode;
                save_display_flag(self.storage.as_ref(), self.dark_mode);
                Vec::new()
            }

            Message::Generate => self.generate(),
            Message::StartNew => {
                match self.machine.start_new() {
                    Ok(()) => self.status.clear(),
                    Err(e) => self.status = e.user_message(),
                }
                Vec::new()
            }
            Message::Download => self.download(),
            Message::Export(format) => self.export(format),
            Message::OpenArtifact => match self.machine.artifact() {
                Some(artifact) => vec![Effect::OpenArtifact {
                    artifact: artifact.clone(),
                }],
                None => Vec::new(),
            },

            Message::PreviewTimer(key) => {
                if self.preview.timer_fired(key) {
                    self.request_preview()
                } else {
                    Vec::new()
                }
            }
            Message::GenerateTimeout(ticket) => self.generate_timed_out(ticket),

            Message::FontsLoaded(result) => {
                self.fonts_loaded(result);
                Vec::new()
            }
            Message::PreviewLoaded { seq, result } => {
                self.preview_loaded(seq, result);
                Vec::new()
            }
            Message::GenerateFinished { ticket, result } => {
                self.generate_finished(ticket, result);
                Vec::new()
            }
            Message::TransferFinished(result) => {
                self.transfer_in_flight = false;
                self.status = match result {
                    Ok(path) => format!("Saved to {}", path.display()),
                    Err(e) => {
                        log::warn!("transfer failed: {}", e);
                        e.user_message()
                    }
                };
                Vec::new()
            }
            Message::AutoStructured { source, result } => self.auto_structured(source, result),

            Message::Quit => vec![Effect::Quit],
        }
    }

    // --- Document ---

    /// Apply a document mutation. `record` is false for undo/redo, which
    /// move through history instead of extending it.
    fn edit(&mut self, text: &str, record: bool) -> Vec<Effect> {
        if self.document.text() == text {
            return Vec::new();
        }
        if let Err(e) = self.machine.document_changing() {
            self.status = e.user_message();
            return Vec::new();
        }
        self.document.set_text(text);
        if record {
            self.history.record_edit(text);
        }
        self.schedule_preview()
    }

    fn undo(&mut self) -> Vec<Effect> {
        if self.machine.is_generating() {
            return Vec::new();
        }
        match self.history.undo() {
            Some(text) => self.edit(&text, false),
            None => Vec::new(),
        }
    }

    fn redo(&mut self) -> Vec<Effect> {
        if self.machine.is_generating() {
            return Vec::new();
        }
        match self.history.redo() {
            Some(text) => self.edit(&text, false),
            None => Vec::new(),
        }
    }

    fn load_template(&mut self, name: &str) -> Vec<Effect> {
        match find_template(name) {
            Some(template) => {
                let effects = self.edit(template.body, true);
                if self.document.text() == template.body {
                    self.status = format!("Loaded template \"{}\".", template.title);
                }
                effects
            }
            None => {
                self.status = AppError::UnknownTemplate(name.to_string()).user_message();
                Vec::new()
            }
        }
    }

    fn import_file(&mut self, path: &Path) -> Vec<Effect> {
        if self.machine.is_generating() {
            return Vec::new();
        }
        match fs::read_to_string(path) {
            Ok(content) => {
                let effects = self.edit(&content, true);
                self.status = format!("Imported {}", path.display());
                effects
            }
            Err(e) => {
                self.status = AppError::from(e).user_message();
                Vec::new()
            }
        }
    }

    fn auto_structure(&mut self) -> Vec<Effect> {
        if self.machine.is_generating() || self.auto_structure_source.is_some() {
            return Vec::new();
        }
        if self.document.is_blank() {
            self.status = "Please enter some text first".to_string();
            return Vec::new();
        }
        let text = self.document.text().to_string();
        self.auto_structure_source = Some(text.clone());
        self.status = "Structuring text...".to_string();
        vec![Effect::AutoStructure { text }]
    }

    fn auto_structured(&mut self, source: String, result: Result<String>) -> Vec<Effect> {
        if self.auto_structure_source.as_deref() != Some(source.as_str()) {
            return Vec::new();
        }
        self.auto_structure_source = None;
        match result {
            Ok(structured) if self.document.text() == source => {
                self.status = "Text structured.".to_string();
                self.edit(&structured, true)
            }
            Ok(_) => {
                self.status = "The text changed while structuring; result discarded.".to_string();
                Vec::new()
            }
            Err(e) => {
                log::warn!("auto-structure failed: {}", e);
                self.status = e.user_message();
                Vec::new()
            }
        }
    }

    // --- Settings ---

    fn update_settings(&mut self, patch: &SettingsPatch) -> Vec<Effect> {
        let before = self.settings.get().clone();
        self.settings.apply(patch);
        if self.settings.get() == &before {
            return Vec::new();
        }
        self.settings.persist();
        self.schedule_preview()
    }

    fn apply_preset(&mut self, name: &str) -> Vec<Effect> {
        match self.settings.apply_preset(name) {
            Ok(()) => {
                self.settings.persist();
                self.status = format!("Applied preset \"{}\".", name);
                self.schedule_preview()
            }
            Err(e) => {
                self.status = e.user_message();
                Vec::new()
            }
        }
    }

    // --- Preview ---

    fn schedule_preview(&mut self) -> Vec<Effect> {
        let key = self.preview.note_edit();
        vec![Effect::ArmPreviewTimer {
            key,
            delay: self.preview.delay(),
        }]
    }

    fn request_preview(&mut self) -> Vec<Effect> {
        if self.document.is_blank() {
            self.preview.placeholder_rendered();
            self.preview_pane = PreviewPane::Placeholder;
            return Vec::new();
        }
        let seq = self.preview.issue();
        vec![Effect::FetchPreview {
            seq,
            text: self.document.text().to_string(),
        }]
    }

    fn preview_loaded(&mut self, seq: u64, result: Result<Vec<PreviewLine>>) {
        match result {
            Ok(lines) => {
                if self.preview.accept(seq) {
                    self.preview_pane = PreviewPane::Lines(lines);
                } else {
                    log::debug!("dropping stale preview {}", seq);
                }
            }
            // Never shown in the status bar. An unreachable server is worth a
            // warning in the log; anything else is noise from a bad request.
            Err(e) => match e.kind() {
                ErrorKind::Transport | ErrorKind::Timeout => {
                    log::warn!("preview {} failed: {}", seq, e)
                }
                _ => log::debug!("preview {} failed: {}", seq, e),
            },
        }
    }

    fn fonts_loaded(&mut self, result: Result<Vec<String>>) {
        let keys = match result {
            Ok(keys) => keys,
            Err(e) => {
                log::debug!("font list unavailable, keeping built-in list: {}", e);
                return;
            }
        };
        let mut fonts: Vec<FontChoice> = Vec::new();
        for key in &keys {
            match FontChoice::from_key(key) {
                Some(font) if !fonts.contains(&font) => fonts.push(font),
                Some(_) => {}
                None => log::debug!("server font {:?} has no local preview, skipping", key),
            }
        }
        if fonts.is_empty() {
            log::warn!("server listed no usable fonts, keeping built-in list");
            return;
        }
        // The selected font stays selectable even if the server dropped it.
        let current = self.settings.get().font;
        if !fonts.contains(&current) {
            fonts.push(current);
        }
        self.fonts = fonts;
    }

    // --- Generation ---

    fn generate(&mut self) -> Vec<Effect> {
        if self.document.is_blank() {
            self.status = "Please enter some text first".to_string();
            return Vec::new();
        }
        let ticket = match self.machine.begin() {
            Ok(ticket) => ticket,
            Err(e) => {
                self.status = e.user_message();
                return Vec::new();
            }
        };
        self.status = "Generating PDF...".to_string();
        let request = GenerateRequest::new(self.document.text(), self.settings.get());
        vec![
            Effect::Generate { ticket, request },
            Effect::ArmGenerateTimeout {
                ticket,
                delay: self.config.generate_timeout(),
            },
        ]
    }

    fn generate_finished(&mut self, ticket: u64, result: Result<ArtifactId>) {
        if !self.machine.is_current(ticket) {
            log::debug!("ignoring late result for generation {}", ticket);
            return;
        }
        match result {
            Ok(artifact) => {
                if self.machine.succeed(ticket, artifact).is_ok() {
                    self.status =
                        "PDF generated successfully! You can download it now.".to_string();
                }
            }
            Err(e) => {
                log::warn!("generation {} failed: {}", ticket, e);
                if self.machine.fail(ticket).is_ok() {
                    self.status = e.user_message();
                }
            }
        }
    }

    fn generate_timed_out(&mut self, ticket: u64) -> Vec<Effect> {
        if !self.machine.is_current(ticket) {
            return Vec::new();
        }
        if self.machine.fail(ticket).is_err() {
            return Vec::new();
        }
        let err = AppError::Timeout(self.config.generate_timeout_secs);
        log::warn!("generation {} timed out", ticket);
        self.status = err.user_message();
        vec![Effect::CancelGenerate { ticket }]
    }

    // --- Downloads ---

    fn transfer_target(&mut self) -> Option<ArtifactId> {
        let Some(artifact) = self.machine.artifact().cloned() else {
            self.status = "Generate a PDF first.".to_string();
            return None;
        };
        if self.transfer_in_flight {
            self.status = "A download is already in progress.".to_string();
            return None;
        }
        Some(artifact)
    }

    fn download(&mut self) -> Vec<Effect> {
        let Some(artifact) = self.transfer_target() else {
            return Vec::new();
        };
        self.transfer_in_flight = true;
        self.status = "Downloading PDF...".to_string();
        let dest = self
            .config
            .download_dir()
            .join(format!("{}.pdf", DOWNLOAD_BASENAME));
        vec![Effect::Transfer(TransferJob::Download { artifact, dest })]
    }

    fn export(&mut self, format: ExportFormat) -> Vec<Effect> {
        let Some(artifact) = self.transfer_target() else {
            return Vec::new();
        };
        self.transfer_in_flight = true;
        self.status = format!(
            "Exporting {}... Image export may not be available on all servers. PDF is always available.",
            format.extension().to_uppercase()
        );
        let dest = self
            .config
            .download_dir()
            .join(format!("{}.{}", DOWNLOAD_BASENAME, format.extension()));
        vec![Effect::Transfer(TransferJob::Export {
            artifact,
            format,
            scan: self.settings.get().scan_effect,
            dest,
        })]
    }
}
