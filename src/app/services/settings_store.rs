use std::sync::Arc;

use crate::app::domain::settings::{Settings, SettingsPatch, SignatureImage, preset};
use crate::app::infrastructure::error::{AppError, Result};

use super::storage::{SETTINGS_KEY, Storage};

/// Current rendering settings plus their durable copy.
pub struct SettingsStore {
    current: Settings,
    storage: Arc<dyn Storage>,
}

impl SettingsStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            current: Settings::default(),
            storage,
        }
    }

    pub fn get(&self) -> &Settings {
        &self.current
    }

    pub fn apply(&mut self, patch: &SettingsPatch) {
        self.current = self.current.merged(patch);
    }

    /// Overwrite only the fields named by the preset.
    pub fn apply_preset(&mut self, name: &str) -> Result<()> {
        let patch = preset(name).ok_or_else(|| AppError::UnknownPreset(name.to_string()))?;
        self.apply(&patch);
        Ok(())
    }

    /// Every rendering option goes back to its default. The signature is
    /// only ever removed by `clear_signature`.
    pub fn reset_to_defaults(&mut self) {
        let signature = self.current.signature.take();
        self.current = Settings {
            signature,
            ..Settings::default()
        };
    }

    pub fn set_signature(&mut self, signature: SignatureImage) {
        self.current.signature = Some(signature);
    }

    pub fn clear_signature(&mut self) {
        self.current.signature = None;
    }

    /// Write the persistent subset. Failures are logged and dropped.
    pub fn persist(&self) {
        let json = match serde_json::to_string(&self.current) {
            Ok(json) => json,
            Err(e) => {
                log::debug!("could not serialize settings: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.write(SETTINGS_KEY, &json) {
            log::debug!("could not persist settings: {}", e);
        }
    }

    /// Restore field by field; anything unreadable keeps its current value.
    pub fn restore(&mut self) {
        let payload = match self.storage.read(SETTINGS_KEY) {
            Ok(Some(payload)) => payload,
            Ok(None) => return,
            Err(e) => {
                log::debug!("could not read persisted settings: {}", e);
                return;
            }
        };
        let patch = SettingsPatch::from_persisted(&payload);
        self.apply(&patch);
    }
}
