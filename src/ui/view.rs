use std::cell::RefCell;
use std::rc::Rc;

use fltk::{
    app::Sender,
    draw,
    enums::{CallbackTrigger, Color, Cursor, Font},
    prelude::*,
    text::{StyleTableEntry, TextBuffer},
};

use super::main_window::MainWidgets;
use super::theme::{apply_theme, ink_color, page_color};
use crate::app::controllers::generation::SessionState;
use crate::app::controllers::preview::{PLACEHOLDER_TEXT, PreviewPane, PreviewStyle};
use crate::app::controllers::session::SessionController;
use crate::app::domain::messages::Message;
use crate::app::domain::settings::FontChoice;
use crate::app::services::api::{LineKind, PreviewLine};

const STYLE_HEADING: char = 'A';
const STYLE_PLAIN: char = 'B';
const STYLE_INK: char = 'C';
const STYLE_PLACEHOLDER: char = 'D';
/// Carried by each line break; its size sets the row pitch.
const STYLE_SPACER: char = 'E';

/// fl_height is roughly this multiple of the point size for the core fonts.
const FONT_HEIGHT_RATIO: f32 = 1.15;

fn style_char(kind: LineKind) -> char {
    match kind {
        LineKind::Title | LineKind::Heading => STYLE_HEADING,
        k if k.uses_ink() => STYLE_INK,
        _ => STYLE_PLAIN,
    }
}

/// Text and style-buffer contents for a list of preview lines. The style
/// buffer holds one style character per byte of text.
fn layout_lines(lines: &[PreviewLine]) -> (String, String) {
    let mut text = String::new();
    let mut styles = String::new();
    for line in lines {
        let style = style_char(line.line_kind());
        text.push_str(&line.content);
        text.push('\n');
        styles.extend(std::iter::repeat_n(style, line.content.len()));
        styles.push(STYLE_SPACER);
    }
    (text, styles)
}

fn preview_font(font: FontChoice) -> Font {
    match font {
        FontChoice::DancingScript => Font::TimesItalic,
        FontChoice::Pacifico => Font::HelveticaBoldItalic,
        FontChoice::ComicNeue => Font::Helvetica,
    }
}

fn style_table(style: &PreviewStyle) -> Vec<StyleTableEntry> {
    let font = preview_font(style.font);
    let size = style.text_px();
    vec![
        StyleTableEntry {
            color: Color::Black,
            font: Font::HelveticaBold,
            size: size + 2,
        },
        StyleTableEntry {
            color: Color::Black,
            font,
            size,
        },
        StyleTableEntry {
            color: ink_color(&style.ink_color),
            font,
            size,
        },
        StyleTableEntry {
            color: Color::from_rgb(150, 150, 150),
            font: Font::HelveticaItalic,
            size: 14,
        },
        // The display sizes every row to its tallest style.
        StyleTableEntry {
            color: Color::Black,
            font: Font::Helvetica,
            size: (style.row_px() as f32 / FONT_HEIGHT_RATIO).round() as i32,
        },
    ]
}

fn draw_rules(x: i32, y: i32, w: i32, h: i32, style: &PreviewStyle) {
    let offsets = style.rule_offsets(h);
    if offsets.is_empty() {
        return;
    }
    draw::push_clip(x, y, w, h);
    draw::set_draw_color(Color::from_rgb(196, 214, 236));
    for dy in offsets {
        draw::draw_line(x, y + dy, x + w, y + dy);
    }
    draw::pop_clip();
}

fn set_active<W: WidgetExt>(widget: &mut W, active: bool) {
    if active {
        widget.activate();
    } else {
        widget.deactivate();
    }
}

/// Projects the session controller onto the widgets. Holds no state of its
/// own beyond what it needs to avoid redundant redraws.
pub struct View {
    widgets: MainWidgets,
    editor_buf: TextBuffer,
    preview_buf: TextBuffer,
    style_buf: TextBuffer,
    rendered_preview: Option<(PreviewPane, PreviewStyle)>,
    /// Style the preview's draw callback rules the page with.
    page: Rc<RefCell<Option<PreviewStyle>>>,
    dark_mode: Option<bool>,
}

impl View {
    pub fn new(mut widgets: MainWidgets, sender: &Sender<Message>) -> Self {
        let editor_buf = widgets.text_editor.buffer().unwrap_or_default();
        let preview_buf = widgets.preview.buffer().unwrap_or_default();
        let style_buf = TextBuffer::default();

        // Only user keystrokes trigger this; programmatic set_text does not.
        widgets.text_editor.set_trigger(CallbackTrigger::Changed);
        let s = *sender;
        let buf = editor_buf.clone();
        widgets
            .text_editor
            .set_callback(move |_| s.send(Message::TextEdited(buf.text())));

        let page: Rc<RefCell<Option<PreviewStyle>>> = Rc::new(RefCell::new(None));
        let draw_page = page.clone();
        widgets.preview.draw(move |d| {
            if let Some(style) = draw_page.borrow().as_ref() {
                draw_rules(d.x(), d.y(), d.w(), d.h(), style);
            }
        });

        let mut wind = widgets.wind.clone();
        let s = *sender;
        wind.set_callback(move |_| {
            if fltk::app::event() == fltk::enums::Event::Close {
                s.send(Message::Quit);
            }
        });

        Self {
            widgets,
            editor_buf,
            preview_buf,
            style_buf,
            rendered_preview: None,
            page,
            dark_mode: None,
        }
    }

    pub fn show(&mut self) {
        self.widgets.wind.show();
    }

    pub fn render(&mut self, session: &SessionController) {
        if self.dark_mode != Some(session.dark_mode()) {
            apply_theme(&mut self.widgets, session.dark_mode());
            self.dark_mode = Some(session.dark_mode());
        }

        if self.editor_buf.text() != session.text() {
            let pos = self.widgets.text_editor.insert_position();
            self.editor_buf.set_text(session.text());
            self.widgets
                .text_editor
                .set_insert_position(pos.min(self.editor_buf.length()));
        }
        set_active(&mut self.widgets.text_editor, session.can_edit());

        let toolbar = &mut self.widgets.toolbar;
        set_active(&mut toolbar.generate, session.can_generate());
        set_active(&mut toolbar.start_new, session.artifact().is_some());
        set_active(&mut toolbar.download, session.can_transfer());
        set_active(&mut toolbar.export_jpg, session.can_transfer());
        set_active(&mut toolbar.export_png, session.can_transfer());
        set_active(&mut toolbar.open, session.artifact().is_some());
        self.sync_menu(session);

        self.widgets.panel.sync(session.settings(), session.fonts());

        match session.state() {
            SessionState::Ready { artifact } => {
                self.widgets.preview.hide();
                self.widgets.ready_frame.set_label(&format!(
                    "Your handwritten PDF is ready ({}).\n\nDownload it, export it as an image or open it in the browser.\nEdit the text or choose Start New to make changes.",
                    artifact.as_str()
                ));
                self.widgets.ready_frame.show();
            }
            _ => {
                self.widgets.ready_frame.hide();
                self.widgets.preview.show();
                self.render_preview(session);
            }
        }
        self.widgets.body.layout();

        self.widgets.status_frame.set_label(session.status());
        let stats = session.stats();
        self.widgets
            .stats_frame
            .set_label(&format!("{} | {}", stats.words_label(), stats.chars_label()));

        self.widgets.wind.set_cursor(if session.is_busy() {
            Cursor::Wait
        } else {
            Cursor::Default
        });
        self.widgets.wind.redraw();
    }

    fn sync_menu(&mut self, session: &SessionController) {
        let items = [
            ("Edit/Undo", session.can_undo()),
            ("Edit/Redo", session.can_redo()),
            ("Edit/Auto-Structure", session.can_edit()),
            ("Document/Generate PDF", session.can_generate()),
            ("Document/Download PDF", session.can_transfer()),
            ("Document/Export/JPG", session.can_transfer()),
            ("Document/Export/PNG", session.can_transfer()),
            ("Document/Open in Browser", session.artifact().is_some()),
        ];
        for (path, active) in items {
            if let Some(mut item) = self.widgets.menu.find_item(path) {
                if active {
                    item.activate();
                } else {
                    item.deactivate();
                }
            }
        }
    }

    fn render_preview(&mut self, session: &SessionController) {
        let pane = session.preview_pane();
        let style = session.preview_style();
        if let Some((last_pane, last_style)) = &self.rendered_preview {
            if last_pane == pane && *last_style == style {
                return;
            }
        }

        let (text, styles) = match pane {
            PreviewPane::Placeholder => (
                PLACEHOLDER_TEXT.to_string(),
                STYLE_PLACEHOLDER.to_string().repeat(PLACEHOLDER_TEXT.len()),
            ),
            PreviewPane::Lines(lines) => layout_lines(lines),
        };
        self.preview_buf.set_text(&text);
        self.style_buf.set_text(&styles);
        self.widgets
            .preview
            .set_highlight_data(self.style_buf.clone(), style_table(&style));
        self.widgets.preview.set_color(page_color(style.page_style));
        *self.page.borrow_mut() = Some(style.clone());
        self.widgets.preview.redraw();

        self.rendered_preview = Some((pane.clone(), style));
    }
}
