use fltk::{enums::Color, prelude::*};

use super::main_window::MainWidgets;
use crate::app::domain::settings::PageStyle;

pub fn apply_theme(widgets: &mut MainWidgets, is_dark: bool) {
    let editor = &mut widgets.text_editor;
    if is_dark {
        // Dark mode colors
        editor.set_color(Color::from_rgb(30, 30, 30));
        editor.set_text_color(Color::from_rgb(220, 220, 220));
        editor.set_cursor_color(Color::from_rgb(255, 255, 255));
        editor.set_selection_color(Color::from_rgb(70, 70, 100));
        widgets.wind.set_color(Color::from_rgb(25, 25, 25));
        widgets.wind.set_label_color(Color::from_rgb(220, 220, 220));
        widgets.menu.set_color(Color::from_rgb(35, 35, 35));
        widgets.menu.set_text_color(Color::from_rgb(220, 220, 220));
        widgets.menu.set_selection_color(Color::from_rgb(60, 60, 60)); // Hover color
        widgets.panel.group.set_color(Color::from_rgb(35, 35, 35));
        widgets.status_frame.set_label_color(Color::from_rgb(220, 220, 220));
        widgets.ready_frame.set_color(Color::from_rgb(40, 40, 40));
        widgets.ready_frame.set_label_color(Color::from_rgb(220, 220, 220));
    } else {
        // Light mode colors
        editor.set_color(Color::White);
        editor.set_text_color(Color::Black);
        editor.set_cursor_color(Color::Black);
        editor.set_selection_color(Color::from_rgb(173, 216, 230));
        widgets.wind.set_color(Color::from_rgb(240, 240, 240));
        widgets.wind.set_label_color(Color::Black);
        widgets.menu.set_color(Color::from_rgb(240, 240, 240));
        widgets.menu.set_text_color(Color::Black);
        widgets.menu.set_selection_color(Color::from_rgb(200, 200, 200)); // Hover color
        widgets.panel.group.set_color(Color::from_rgb(240, 240, 240));
        widgets.status_frame.set_label_color(Color::Black);
        widgets.ready_frame.set_color(Color::from_rgb(250, 250, 250));
        widgets.ready_frame.set_label_color(Color::Black);
    }

    widgets.wind.redraw();
}

/// Paper colour behind the preview. The preview always looks like paper,
/// whatever the window theme.
pub fn page_color(style: PageStyle) -> Color {
    match style {
        PageStyle::Blank => Color::White,
        PageStyle::Cream => Color::from_rgb(255, 253, 240),
        PageStyle::Aged => Color::from_rgb(243, 233, 208),
        PageStyle::Notebook => Color::from_rgb(250, 251, 255),
        PageStyle::Grid => Color::from_rgb(248, 248, 248),
    }
}

/// Ink colour for the preview, falling back to the default navy.
pub fn ink_color(hex: &str) -> Color {
    Color::from_hex_str(hex).unwrap_or(Color::from_rgb(10, 31, 92))
}
