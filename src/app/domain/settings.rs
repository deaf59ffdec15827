use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex_lite::Regex;

use crate::app::infrastructure::error::{AppError, Result};

pub const FONT_SIZE_RANGE: RangeInclusive<u32> = 10..=36;
pub const LINE_SPACING_RANGE: RangeInclusive<u32> = 16..=50;
pub const MARGIN_LEFT_RANGE: RangeInclusive<u32> = 20..=120;
pub const JITTER_STRENGTH_RANGE: RangeInclusive<f32> = 0.0..=2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FontChoice {
    DancingScript,
    Pacifico,
    #[default]
    ComicNeue,
}

impl FontChoice {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::DancingScript => "Dancing Script",
            Self::Pacifico => "Pacifico",
            Self::ComicNeue => "Comic Neue",
        }
    }

    pub fn all() -> &'static [FontChoice] {
        &[Self::DancingScript, Self::Pacifico, Self::ComicNeue]
    }

    /// Map a font key as listed by the rendering server.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::all().iter().copied().find(|f| f.key() == key)
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::DancingScript => "DancingScript",
            Self::Pacifico => "Pacifico",
            Self::ComicNeue => "ComicNeue",
        }
    }

    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|f| f.display_name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PageStyle {
    #[default]
    Blank,
    Cream,
    Aged,
    Notebook,
    Grid,
}

impl PageStyle {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Blank => "Blank",
            Self::Cream => "Cream",
            Self::Aged => "Aged paper",
            Self::Notebook => "Notebook",
            Self::Grid => "Grid",
        }
    }

    pub fn all() -> &'static [PageStyle] {
        &[Self::Blank, Self::Cream, Self::Aged, Self::Notebook, Self::Grid]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
}

impl PageSize {
    pub fn all() -> &'static [PageSize] {
        &[Self::A4, Self::Letter, Self::Legal]
    }
}

/// Signature image attached to generated documents. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureImage {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

impl SignatureImage {
    pub fn from_file(path: &Path) -> Result<Self> {
        let mime = match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            _ => {
                return Err(AppError::Storage(format!(
                    "unsupported signature image: {}",
                    path.display()
                )));
            }
        };
        let bytes = fs::read(path)?;
        Ok(Self { bytes, mime })
    }

    /// `data:` URL form sent to the rendering service.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

/// Rendering options. Fields marked `skip` are never written to durable storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub font: FontChoice,
    pub font_size: u32,
    pub line_spacing: u32,
    pub ink_color: String,
    pub margin_left: u32,
    pub page_style: PageStyle,
    pub page_size: PageSize,
    pub spacing_variation: bool,
    pub jitter: bool,
    pub jitter_strength: f32,
    pub ink_variation: bool,
    pub margin_rule: bool,
    pub header_text: String,
    pub footer_text: String,
    pub watermark_text: String,

    #[serde(skip)]
    pub scan_effect: bool,

    #[serde(skip)]
    pub signature: Option<SignatureImage>,
}

pub const DEFAULT_INK_COLOR: &str = "#0A1F5C";

impl Default for Settings {
    fn default() -> Self {
        Self {
            font: FontChoice::default(),
            font_size: 18,
            line_spacing: 28,
            ink_color: DEFAULT_INK_COLOR.to_string(),
            margin_left: 60,
            page_style: PageStyle::default(),
            page_size: PageSize::default(),
            spacing_variation: true,
            jitter: true,
            jitter_strength: 1.0,
            ink_variation: true,
            margin_rule: false,
            header_text: String::new(),
            footer_text: String::new(),
            watermark_text: String::new(),
            scan_effect: false,
            signature: None,
        }
    }
}

/// A partial update. `None` leaves the corresponding field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsPatch {
    pub font: Option<FontChoice>,
    pub font_size: Option<u32>,
    pub line_spacing: Option<u32>,
    pub ink_color: Option<String>,
    pub margin_left: Option<u32>,
    pub page_style: Option<PageStyle>,
    pub page_size: Option<PageSize>,
    pub spacing_variation: Option<bool>,
    pub jitter: Option<bool>,
    pub jitter_strength: Option<f32>,
    pub ink_variation: Option<bool>,
    pub margin_rule: Option<bool>,
    pub header_text: Option<String>,
    pub footer_text: Option<String>,
    pub watermark_text: Option<String>,
    pub scan_effect: Option<bool>,
}

static INK_COLOR_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").ok());

pub fn is_valid_ink_color(color: &str) -> bool {
    INK_COLOR_RE.as_ref().is_some_and(|re| re.is_match(color))
}

fn clamp_u32(value: u32, range: &RangeInclusive<u32>) -> u32 {
    value.clamp(*range.start(), *range.end())
}

impl Settings {
    /// Pure merge: numbers are clamped into range, an invalid ink colour or a
    /// non-finite jitter strength keeps the prior value.
    pub fn merged(&self, patch: &SettingsPatch) -> Settings {
        let mut next = self.clone();
        if let Some(font) = patch.font {
            next.font = font;
        }
        if let Some(size) = patch.font_size {
            next.font_size = clamp_u32(size, &FONT_SIZE_RANGE);
        }
        if let Some(spacing) = patch.line_spacing {
            next.line_spacing = clamp_u32(spacing, &LINE_SPACING_RANGE);
        }
        if let Some(ref color) = patch.ink_color {
            if is_valid_ink_color(color) {
                next.ink_color = color.clone();
            }
        }
        if let Some(margin) = patch.margin_left {
            next.margin_left = clamp_u32(margin, &MARGIN_LEFT_RANGE);
        }
        if let Some(style) = patch.page_style {
            next.page_style = style;
        }
        if let Some(size) = patch.page_size {
            next.page_size = size;
        }
        if let Some(v) = patch.spacing_variation {
            next.spacing_variation = v;
        }
        if let Some(v) = patch.jitter {
            next.jitter = v;
        }
        if let Some(strength) = patch.jitter_strength {
            if strength.is_finite() {
                next.jitter_strength =
                    strength.clamp(*JITTER_STRENGTH_RANGE.start(), *JITTER_STRENGTH_RANGE.end());
            }
        }
        if let Some(v) = patch.ink_variation {
            next.ink_variation = v;
        }
        if let Some(v) = patch.margin_rule {
            next.margin_rule = v;
        }
        if let Some(ref text) = patch.header_text {
            next.header_text = text.clone();
        }
        if let Some(ref text) = patch.footer_text {
            next.footer_text = text.clone();
        }
        if let Some(ref text) = patch.watermark_text {
            next.watermark_text = text.clone();
        }
        if let Some(v) = patch.scan_effect {
            next.scan_effect = v;
        }
        next
    }
}

fn field<T: DeserializeOwned>(obj: &Map<String, Value>, key: &str) -> Option<T> {
    obj.get(key)
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
}

impl SettingsPatch {
    /// Build a patch from a persisted payload, keeping only fields that are
    /// present, well-typed and in range. Anything else is left as `None`.
    pub fn from_persisted(payload: &str) -> SettingsPatch {
        let obj = match serde_json::from_str::<Value>(payload) {
            Ok(Value::Object(obj)) => obj,
            _ => return SettingsPatch::default(),
        };

        SettingsPatch {
            font: field(&obj, "font"),
            font_size: field::<u32>(&obj, "font_size").filter(|v| FONT_SIZE_RANGE.contains(v)),
            line_spacing: field::<u32>(&obj, "line_spacing")
                .filter(|v| LINE_SPACING_RANGE.contains(v)),
            ink_color: field::<String>(&obj, "ink_color").filter(|c| is_valid_ink_color(c)),
            margin_left: field::<u32>(&obj, "margin_left")
                .filter(|v| MARGIN_LEFT_RANGE.contains(v)),
            page_style: field(&obj, "page_style"),
            page_size: field(&obj, "page_size"),
            spacing_variation: field(&obj, "spacing_variation"),
            jitter: field(&obj, "jitter"),
            jitter_strength: field::<f32>(&obj, "jitter_strength")
                .filter(|v| JITTER_STRENGTH_RANGE.contains(v)),
            ink_variation: field(&obj, "ink_variation"),
            margin_rule: field(&obj, "margin_rule"),
            header_text: field(&obj, "header_text"),
            footer_text: field(&obj, "footer_text"),
            watermark_text: field(&obj, "watermark_text"),
            scan_effect: None,
        }
    }
}

pub const PRESET_NAMES: &[&str] = &["neat", "messy", "compact", "exam"];

/// Fixed preset table. Each preset only names the fields it overrides.
pub fn preset(name: &str) -> Option<SettingsPatch> {
    let patch = match name {
        "neat" => SettingsPatch {
            font_size: Some(16),
            jitter_strength: Some(0.4),
            spacing_variation: Some(false),
            ..Default::default()
        },
        "messy" => SettingsPatch {
            font_size: Some(20),
            jitter: Some(true),
            jitter_strength: Some(1.6),
            spacing_variation: Some(true),
            ink_variation: Some(true),
            ..Default::default()
        },
        "compact" => SettingsPatch {
            font_size: Some(14),
            line_spacing: Some(22),
            ..Default::default()
        },
        "exam" => SettingsPatch {
            font: Some(FontChoice::ComicNeue),
            page_style: Some(PageStyle::Notebook),
            margin_rule: Some(true),
            ink_color: Some("#1A1A8C".to_string()),
            ..Default::default()
        },
        _ => return None,
    };
    Some(patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.font, FontChoice::ComicNeue);
        assert_eq!(settings.font_size, 18);
        assert_eq!(settings.line_spacing, 28);
        assert_eq!(settings.ink_color, "#0A1F5C");
        assert_eq!(settings.margin_left, 60);
        assert_eq!(settings.page_style, PageStyle::Blank);
        assert_eq!(settings.page_size, PageSize::A4);
        assert!(settings.jitter);
        assert!(!settings.scan_effect);
        assert!(settings.signature.is_none());
    }

    #[test]
    fn test_merge_keeps_unspecified_fields() {
        let base = Settings {
            margin_left: 80,
            ..Default::default()
        };
        let patch = SettingsPatch {
            font_size: Some(24),
            ..Default::default()
        };
        let merged = base.merged(&patch);
        assert_eq!(merged.font_size, 24);
        assert_eq!(merged.margin_left, 80);
        assert_eq!(merged.ink_color, base.ink_color);
    }

    #[test]
    fn test_merge_clamps_and_rejects() {
        let patch = SettingsPatch {
            font_size: Some(100),
            line_spacing: Some(2),
            ink_color: Some("blue".to_string()),
            jitter_strength: Some(f32::NAN),
            ..Default::default()
        };
        let merged = Settings::default().merged(&patch);
        assert_eq!(merged.font_size, 36);
        assert_eq!(merged.line_spacing, 16);
        assert_eq!(merged.ink_color, DEFAULT_INK_COLOR);
        assert_eq!(merged.jitter_strength, 1.0);
    }

    #[test]
    fn test_font_keys_match_wire_names() {
        for font in FontChoice::all() {
            let wire = serde_json::to_value(font).unwrap();
            assert_eq!(wire, font.key());
            assert_eq!(FontChoice::from_key(font.key()), Some(*font));
            assert_eq!(FontChoice::from_display_name(font.display_name()), Some(*font));
        }
        assert_eq!(FontChoice::from_key("Caveat"), None);
        assert_eq!(FontChoice::from_key("Comic Neue"), None);
    }

    #[test]
    fn test_ink_color_validation() {
        assert!(is_valid_ink_color("#0a1f5c"));
        assert!(is_valid_ink_color("#FFFFFF"));
        assert!(!is_valid_ink_color("#FFF"));
        assert!(!is_valid_ink_color("0A1F5C"));
        assert!(!is_valid_ink_color("#0A1F5CZ"));
    }

    #[test]
    fn test_neat_preset() {
        let base = Settings {
            font_size: 30,
            jitter_strength: 1.9,
            margin_left: 100,
            ..Default::default()
        };
        let patch = preset("neat").unwrap();
        let merged = base.merged(&patch);
        assert_eq!(merged.font_size, 16);
        assert_eq!(merged.jitter_strength, 0.4);
        assert_eq!(merged.margin_left, 100);
    }

    #[test]
    fn test_every_named_preset_exists() {
        for name in PRESET_NAMES {
            assert!(preset(name).is_some(), "missing preset {}", name);
        }
        assert!(preset("fancy").is_none());
    }

    #[test]
    fn test_persisted_skips_transient_fields() {
        let settings = Settings {
            scan_effect: true,
            signature: Some(SignatureImage {
                bytes: vec![1, 2, 3],
                mime: "image/png",
            }),
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("scan_effect"));
        assert!(!json.contains("signature"));
        assert!(json.contains("\"page_style\":\"blank\""));
    }

    #[test]
    fn test_patch_from_partial_payload() {
        let patch = SettingsPatch::from_persisted(r#"{"font_size": 22, "page_style": "grid"}"#);
        assert_eq!(patch.font_size, Some(22));
        assert_eq!(patch.page_style, Some(PageStyle::Grid));
        assert_eq!(patch.line_spacing, None);
        assert_eq!(patch.font, None);
    }

    #[test]
    fn test_patch_from_wrong_types() {
        let json = r##"{
            "font": 7,
            "font_size": "huge",
            "line_spacing": 30,
            "ink_color": "#12345",
            "margin_left": 500,
            "jitter": "yes",
            "ink_variation": false,
            "page_size": "Tabloid"
        }"##;
        let patch = SettingsPatch::from_persisted(json);
        assert_eq!(patch.font, None);
        assert_eq!(patch.font_size, None);
        assert_eq!(patch.line_spacing, Some(30));
        assert_eq!(patch.ink_color, None);
        assert_eq!(patch.margin_left, None);
        assert_eq!(patch.jitter, None);
        assert_eq!(patch.ink_variation, Some(false));
        assert_eq!(patch.page_size, None);
    }

    #[test]
    fn test_patch_from_garbage() {
        assert_eq!(SettingsPatch::from_persisted("{{{"), SettingsPatch::default());
        assert_eq!(SettingsPatch::from_persisted("[1,2]"), SettingsPatch::default());
        assert_eq!(SettingsPatch::from_persisted(""), SettingsPatch::default());
    }

    #[test]
    fn test_signature_data_url() {
        let sig = SignatureImage {
            bytes: b"abc".to_vec(),
            mime: "image/png",
        };
        assert_eq!(sig.data_url(), "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_signature_rejects_unknown_extension() {
        let err = SignatureImage::from_file(Path::new("/tmp/signature.gif")).unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
    }
}
