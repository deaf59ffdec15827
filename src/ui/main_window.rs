use fltk::{
    app::Sender,
    button::Button,
    enums::{Align, Color, FrameType},
    frame::Frame,
    group::{Flex, FlexType},
    menu::MenuBar,
    prelude::*,
    text::{TextBuffer, TextDisplay, TextEditor, WrapMode},
    window::Window,
};

use super::settings_panel::{PANEL_WIDTH, SettingsPanel};
use crate::app::domain::messages::Message;
use crate::app::domain::settings::Settings;
use crate::app::services::api::ExportFormat;

pub struct Toolbar {
    pub generate: Button,
    pub start_new: Button,
    pub download: Button,
    pub export_jpg: Button,
    pub export_png: Button,
    pub open: Button,
}

pub struct MainWidgets {
    pub wind: Window,
    pub body: Flex,
    pub menu: MenuBar,
    pub toolbar: Toolbar,
    pub panel: SettingsPanel,
    pub text_editor: TextEditor,
    pub preview: TextDisplay,
    pub ready_frame: Frame,
    pub status_frame: Frame,
    pub stats_frame: Frame,
}

fn tool_button(bar: &mut Flex, label: &str, width: i32, sender: &Sender<Message>, msg: fn() -> Message) -> Button {
    let mut btn = Button::default().with_label(label);
    bar.fixed(&btn, width);
    let s = *sender;
    btn.set_callback(move |_| s.send(msg()));
    btn
}

pub fn build_main_window(sender: &Sender<Message>, settings: &Settings) -> MainWidgets {
    let mut wind = Window::new(100, 100, 1100, 720, "QuillPad");
    wind.set_xclass("QuillPad");

    let mut root = Flex::new(0, 0, 1100, 720, None);
    root.set_type(FlexType::Column);

    let menu = MenuBar::new(0, 0, 0, 30, "");
    root.fixed(&menu, 30);

    let mut bar = Flex::default();
    bar.set_type(FlexType::Row);
    bar.set_margin(3);
    bar.set_pad(4);
    let toolbar = Toolbar {
        generate: tool_button(&mut bar, "Generate PDF", 120, sender, || Message::Generate),
        start_new: tool_button(&mut bar, "Start New", 90, sender, || Message::StartNew),
        download: tool_button(&mut bar, "Download PDF", 120, sender, || Message::Download),
        export_jpg: tool_button(&mut bar, "Export JPG", 100, sender, || {
            Message::Export(ExportFormat::Jpg)
        }),
        export_png: tool_button(&mut bar, "Export PNG", 100, sender, || {
            Message::Export(ExportFormat::Png)
        }),
        open: tool_button(&mut bar, "Open in Browser", 130, sender, || Message::OpenArtifact),
    };
    Frame::default();
    bar.end();
    root.fixed(&bar, 36);

    let mut body = Flex::default();
    body.set_type(FlexType::Row);

    let panel = SettingsPanel::new(sender, settings);
    body.fixed(&panel.group, PANEL_WIDTH);

    let mut text_editor = TextEditor::default();
    text_editor.set_buffer(TextBuffer::default());
    text_editor.wrap_mode(WrapMode::AtBounds, 0);

    let mut preview = TextDisplay::default();
    preview.set_buffer(TextBuffer::default());
    preview.wrap_mode(WrapMode::AtBounds, 0);

    let mut ready_frame = Frame::default();
    ready_frame.set_frame(FrameType::FlatBox);
    ready_frame.set_align(Align::Center | Align::Inside | Align::Wrap);
    ready_frame.hide();

    body.end();

    let mut footer = Flex::default();
    footer.set_type(FlexType::Row);
    let mut status_frame = Frame::default().with_align(Align::Left | Align::Inside);
    status_frame.set_label_size(13);
    let mut stats_frame = Frame::default().with_align(Align::Right | Align::Inside);
    stats_frame.set_label_size(13);
    stats_frame.set_label_color(Color::from_rgb(100, 100, 100));
    footer.fixed(&stats_frame, 240);
    footer.end();
    root.fixed(&footer, 24);

    root.end();
    wind.resizable(&root);
    wind.end();

    MainWidgets {
        wind,
        body,
        menu,
        toolbar,
        panel,
        text_editor,
        preview,
        ready_frame,
        status_frame,
        stats_frame,
    }
}
