use std::time::Duration;

use crate::app::domain::settings::{FontChoice, PageStyle, Settings};
use crate::app::services::api::PreviewLine;

pub const PLACEHOLDER_TEXT: &str =
    "Start typing to see a live preview of your handwritten assignment";

/// Preview text size at the default font size of 18.
pub const PREVIEW_TEXT_PX: f32 = 14.0;

/// What the preview pane currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewPane {
    Placeholder,
    Lines(Vec<PreviewLine>),
}

/// Presentation derived from the settings at render time, so a settings
/// change restyles the pane without another round-trip.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewStyle {
    pub font: FontChoice,
    pub font_scale: f32,
    pub line_height: f32,
    pub ink_color: String,
    pub page_style: PageStyle,
    /// Ruled line pitch for notebook pages.
    pub rule_height: Option<u32>,
}

impl PreviewStyle {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            font: settings.font,
            font_scale: settings.font_size as f32 / 18.0,
            line_height: settings.line_spacing as f32 / 28.0 * 1.6,
            ink_color: settings.ink_color.clone(),
            page_style: settings.page_style,
            rule_height: (settings.page_style == PageStyle::Notebook)
                .then_some(settings.line_spacing),
        }
    }

    pub fn text_px(&self) -> i32 {
        (PREVIEW_TEXT_PX * self.font_scale).round() as i32
    }

    /// Baseline-to-baseline distance. Never tighter than the text itself.
    pub fn row_px(&self) -> i32 {
        let text = self.text_px();
        ((text as f32 * self.line_height).round() as i32).max(text)
    }

    /// Vertical offsets of the notebook rules in a pane `height` pixels tall.
    pub fn rule_offsets(&self, height: i32) -> Vec<i32> {
        match self.rule_height {
            Some(pitch) if pitch > 0 => (1..)
                .map(|n| n * pitch as i32)
                .take_while(|y| *y < height)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Debounces edits into preview requests and drops out-of-order responses.
///
/// Every edit bumps the timer key; only the timer armed by the latest edit
/// is honoured. Requests carry increasing sequence numbers and a response is
/// rendered only if it is newer than whatever was rendered last.
#[derive(Debug)]
pub struct PreviewScheduler {
    delay: Duration,
    timer_key: u64,
    pending: bool,
    last_issued: u64,
    last_rendered: u64,
}

impl PreviewScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            timer_key: 0,
            pending: false,
            last_issued: 0,
            last_rendered: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Restart the quiet period. Returns the key the new timer must carry.
    pub fn note_edit(&mut self) -> u64 {
        self.timer_key += 1;
        self.pending = true;
        self.timer_key
    }

    /// True when `key` belongs to the latest armed timer and it has not fired yet.
    pub fn timer_fired(&mut self, key: u64) -> bool {
        if key != self.timer_key || !self.pending {
            return false;
        }
        self.pending = false;
        true
    }

    /// Allocate the sequence number for an outbound request. Cancels any
    /// pending debounce, since this request already covers it.
    pub fn issue(&mut self) -> u64 {
        self.pending = false;
        self.last_issued += 1;
        self.last_issued
    }

    /// True if the response for `seq` may be rendered; records it as rendered.
    pub fn accept(&mut self, seq: u64) -> bool {
        if seq <= self.last_rendered || seq > self.last_issued {
            return false;
        }
        self.last_rendered = seq;
        true
    }

    /// The placeholder supersedes every request issued so far.
    pub fn placeholder_rendered(&mut self) {
        self.pending = false;
        self.last_rendered = self.last_issued;
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pending
    }
}
