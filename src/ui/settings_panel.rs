use fltk::{
    app::Sender,
    button::CheckButton,
    enums::{Align, CallbackTrigger},
    frame::Frame,
    group::{Flex, FlexType},
    input::Input,
    menu::Choice,
    misc::Spinner,
    prelude::*,
    valuator::HorNiceSlider,
};

use crate::app::domain::messages::Message;
use crate::app::domain::settings::{
    FONT_SIZE_RANGE, FontChoice, JITTER_STRENGTH_RANGE, LINE_SPACING_RANGE, MARGIN_LEFT_RANGE,
    PageSize, PageStyle, Settings, SettingsPatch,
};

pub const PANEL_WIDTH: i32 = 250;
const ROW: i32 = 25;

/// Sidebar with one widget per rendering option. Every change is sent as a
/// `SettingsPatch` naming only the field that changed.
pub struct SettingsPanel {
    pub group: Flex,
    font: Choice,
    fonts: Vec<FontChoice>,
    font_size: Spinner,
    line_spacing: Spinner,
    ink_color: Input,
    /// Stored colour the ink field last reflected.
    synced_ink: String,
    margin_left: Spinner,
    page_style: Choice,
    page_size: Choice,
    spacing_variation: CheckButton,
    jitter: CheckButton,
    jitter_strength: HorNiceSlider,
    ink_variation: CheckButton,
    margin_rule: CheckButton,
    scan_effect: CheckButton,
    header_text: Input,
    footer_text: Input,
    watermark_text: Input,
}

fn send_patch(s: Sender<Message>, patch: SettingsPatch) {
    s.send(Message::UpdateSettings(patch));
}

fn caption(flex: &mut Flex, text: &str) {
    let f = Frame::default()
        .with_label(text)
        .with_align(Align::Left | Align::Inside);
    flex.fixed(&f, 20);
}

fn spinner(flex: &mut Flex, text: &str, min: u32, max: u32) -> Spinner {
    caption(flex, text);
    let mut sp = Spinner::default();
    sp.set_range(min as f64, max as f64);
    sp.set_step(1.0);
    flex.fixed(&sp, ROW);
    sp
}

fn check(flex: &mut Flex, text: &str) -> CheckButton {
    let cb = CheckButton::default().with_label(text);
    flex.fixed(&cb, ROW);
    cb
}

fn text_input(flex: &mut Flex, text: &str) -> Input {
    caption(flex, text);
    let mut input = Input::default();
    input.set_trigger(CallbackTrigger::Changed);
    flex.fixed(&input, ROW);
    input
}

fn choice(flex: &mut Flex, text: &str, labels: &[&str]) -> Choice {
    caption(flex, text);
    let mut c = Choice::default();
    for label in labels {
        c.add_choice(label);
    }
    flex.fixed(&c, ROW);
    c
}

fn index_of<T: PartialEq>(all: &[T], value: &T) -> i32 {
    all.iter().position(|v| v == value).map(|i| i as i32).unwrap_or(0)
}

fn at<T: Copy>(all: &[T], index: i32) -> Option<T> {
    usize::try_from(index).ok().and_then(|i| all.get(i).copied())
}

/// New contents for the ink field, if it needs overwriting. A half-typed
/// colour survives until the stored colour itself changes.
fn ink_field_update<'a>(synced: &str, stored: &'a str, typed: &str) -> Option<&'a str> {
    if stored == synced || typed.eq_ignore_ascii_case(stored) {
        None
    } else {
        Some(stored)
    }
}

impl SettingsPanel {
    pub fn new(sender: &Sender<Message>, initial: &Settings) -> Self {
        let mut group = Flex::default();
        group.set_type(FlexType::Column);
        group.set_margin(8);
        group.set_pad(2);

        let font_labels: Vec<&str> = FontChoice::all().iter().map(|f| f.display_name()).collect();
        let mut font = choice(&mut group, "Font:", &font_labels);
        let mut font_size = spinner(
            &mut group,
            "Font size:",
            *FONT_SIZE_RANGE.start(),
            *FONT_SIZE_RANGE.end(),
        );
        let mut line_spacing = spinner(
            &mut group,
            "Line spacing:",
            *LINE_SPACING_RANGE.start(),
            *LINE_SPACING_RANGE.end(),
        );
        let mut ink_color = text_input(&mut group, "Ink colour (#RRGGBB):");
        ink_color.set_value(&initial.ink_color);
        let mut margin_left = spinner(
            &mut group,
            "Left margin:",
            *MARGIN_LEFT_RANGE.start(),
            *MARGIN_LEFT_RANGE.end(),
        );

        let style_labels: Vec<&str> = PageStyle::all().iter().map(|p| p.display_name()).collect();
        let mut page_style = choice(&mut group, "Page style:", &style_labels);
        let mut page_size = choice(&mut group, "Page size:", &["A4", "Letter", "Legal"]);

        let mut spacing_variation = check(&mut group, "Vary word spacing");
        let mut jitter = check(&mut group, "Baseline jitter");
        caption(&mut group, "Jitter strength:");
        let mut jitter_strength = HorNiceSlider::default();
        jitter_strength.set_range(
            *JITTER_STRENGTH_RANGE.start() as f64,
            *JITTER_STRENGTH_RANGE.end() as f64,
        );
        jitter_strength.set_step(0.1, 1);
        group.fixed(&jitter_strength, ROW);
        let mut ink_variation = check(&mut group, "Ink variation");
        let mut margin_rule = check(&mut group, "Margin rule");
        let mut scan_effect = check(&mut group, "Scanned look (exports)");

        let mut header_text = text_input(&mut group, "Header:");
        let mut footer_text = text_input(&mut group, "Footer:");
        let mut watermark_text = text_input(&mut group, "Watermark:");

        // Filler so the rows keep their fixed heights.
        Frame::default();
        group.end();

        font.set_callback({
            let s = *sender;
            move |c| {
                if let Some(f) = c.choice().and_then(|label| FontChoice::from_display_name(&label)) {
                    send_patch(s, SettingsPatch { font: Some(f), ..Default::default() });
                }
            }
        });
        font_size.set_callback({
            let s = *sender;
            move |sp| {
                send_patch(s, SettingsPatch { font_size: Some(sp.value() as u32), ..Default::default() })
            }
        });
        line_spacing.set_callback({
            let s = *sender;
            move |sp| {
                send_patch(s, SettingsPatch { line_spacing: Some(sp.value() as u32), ..Default::default() })
            }
        });
        ink_color.set_callback({
            let s = *sender;
            move |i| {
                send_patch(s, SettingsPatch { ink_color: Some(i.value()), ..Default::default() })
            }
        });
        margin_left.set_callback({
            let s = *sender;
            move |sp| {
                send_patch(s, SettingsPatch { margin_left: Some(sp.value() as u32), ..Default::default() })
            }
        });
        page_style.set_callback({
            let s = *sender;
            move |c| {
                if let Some(p) = at(PageStyle::all(), c.value()) {
                    send_patch(s, SettingsPatch { page_style: Some(p), ..Default::default() });
                }
            }
        });
        page_size.set_callback({
            let s = *sender;
            move |c| {
                if let Some(p) = at(PageSize::all(), c.value()) {
                    send_patch(s, SettingsPatch { page_size: Some(p), ..Default::default() });
                }
            }
        });
        spacing_variation.set_callback({
            let s = *sender;
            move |b| {
                send_patch(s, SettingsPatch { spacing_variation: Some(b.value()), ..Default::default() })
            }
        });
        jitter.set_callback({
            let s = *sender;
            move |b| send_patch(s, SettingsPatch { jitter: Some(b.value()), ..Default::default() })
        });
        jitter_strength.set_callback({
            let s = *sender;
            move |v| {
                send_patch(s, SettingsPatch { jitter_strength: Some(v.value() as f32), ..Default::default() })
            }
        });
        ink_variation.set_callback({
            let s = *sender;
            move |b| {
                send_patch(s, SettingsPatch { ink_variation: Some(b.value()), ..Default::default() })
            }
        });
        margin_rule.set_callback({
            let s = *sender;
            move |b| send_patch(s, SettingsPatch { margin_rule: Some(b.value()), ..Default::default() })
        });
        scan_effect.set_callback({
            let s = *sender;
            move |b| send_patch(s, SettingsPatch { scan_effect: Some(b.value()), ..Default::default() })
        });
        header_text.set_callback({
            let s = *sender;
            move |i| send_patch(s, SettingsPatch { header_text: Some(i.value()), ..Default::default() })
        });
        footer_text.set_callback({
            let s = *sender;
            move |i| send_patch(s, SettingsPatch { footer_text: Some(i.value()), ..Default::default() })
        });
        watermark_text.set_callback({
            let s = *sender;
            move |i| {
                send_patch(s, SettingsPatch { watermark_text: Some(i.value()), ..Default::default() })
            }
        });

        let mut panel = Self {
            group,
            font,
            fonts: FontChoice::all().to_vec(),
            font_size,
            line_spacing,
            ink_color,
            synced_ink: initial.ink_color.clone(),
            margin_left,
            page_style,
            page_size,
            spacing_variation,
            jitter,
            jitter_strength,
            ink_variation,
            margin_rule,
            scan_effect,
            header_text,
            footer_text,
            watermark_text,
        };
        panel.sync(initial, FontChoice::all());
        panel
    }

    /// Bring every widget in line with `settings`. Widgets that already show
    /// the right value are left alone so the cursor in a text field survives.
    pub fn sync(&mut self, settings: &Settings, fonts: &[FontChoice]) {
        if self.fonts != fonts {
            self.font.clear();
            for f in fonts {
                self.font.add_choice(f.display_name());
            }
            self.fonts = fonts.to_vec();
        }
        let font = index_of(&self.fonts, &settings.font);
        if self.font.value() != font {
            self.font.set_value(font);
        }
        sync_spinner(&mut self.font_size, settings.font_size);
        sync_spinner(&mut self.line_spacing, settings.line_spacing);
        sync_spinner(&mut self.margin_left, settings.margin_left);

        let typed = self.ink_color.value();
        if let Some(stored) = ink_field_update(&self.synced_ink, &settings.ink_color, &typed) {
            self.ink_color.set_value(stored);
        }
        if self.synced_ink != settings.ink_color {
            self.synced_ink = settings.ink_color.clone();
        }

        let style = index_of(PageStyle::all(), &settings.page_style);
        if self.page_style.value() != style {
            self.page_style.set_value(style);
        }
        let size = index_of(PageSize::all(), &settings.page_size);
        if self.page_size.value() != size {
            self.page_size.set_value(size);
        }

        self.spacing_variation.set_value(settings.spacing_variation);
        self.jitter.set_value(settings.jitter);
        if (self.jitter_strength.value() - settings.jitter_strength as f64).abs() > 1e-3 {
            self.jitter_strength.set_value(settings.jitter_strength as f64);
        }
        self.ink_variation.set_value(settings.ink_variation);
        self.margin_rule.set_value(settings.margin_rule);
        self.scan_effect.set_value(settings.scan_effect);

        sync_input(&mut self.header_text, &settings.header_text);
        sync_input(&mut self.footer_text, &settings.footer_text);
        sync_input(&mut self.watermark_text, &settings.watermark_text);
    }
}

fn sync_spinner(sp: &mut Spinner, value: u32) {
    if sp.value() as u32 != value {
        sp.set_value(value as f64);
    }
}

fn sync_input(input: &mut Input, value: &str) {
    if input.value() != value {
        input.set_value(value);
    }
}
