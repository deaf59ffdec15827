use fltk::{
    app::Sender,
    enums::{Key, Shortcut},
    menu::{MenuBar, MenuFlag},
    prelude::*,
};

use super::file_dialogs::{open_signature_dialog, open_text_dialog};
use crate::app::domain::messages::Message;
use crate::app::domain::settings::PRESET_NAMES;
use crate::app::services::api::ExportFormat;
use crate::app::services::templates::TEMPLATES;

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn build_menu(menu: &mut MenuBar, sender: &Sender<Message>, initial_dark_mode: bool) {
    let s = sender;

    // File
    menu.add("File/Import Text...", Shortcut::Ctrl | 'o', MenuFlag::Normal, {
        let s = *s;
        move |_| {
            if let Some(path) = open_text_dialog() {
                s.send(Message::ImportFile(path));
            }
        }
    });
    for template in TEMPLATES {
        let name = template.name.to_string();
        menu.add(&format!("File/Templates/{}", template.title), Shortcut::None, MenuFlag::Normal, {
            let s = *s;
            move |_| s.send(Message::LoadTemplate(name.clone()))
        });
    }
    menu.add("File/Quit", Shortcut::Ctrl | 'q', MenuFlag::Normal, { let s = *s; move |_| s.send(Message::Quit) });

    // Edit
    menu.add("Edit/Undo", Shortcut::Ctrl | 'z', MenuFlag::Normal, { let s = *s; move |_| s.send(Message::Undo) });
    menu.add("Edit/Redo", Shortcut::Ctrl | Shortcut::Shift | 'z', MenuFlag::Normal, { let s = *s; move |_| s.send(Message::Redo) });
    menu.add("Edit/Auto-Structure", Shortcut::Ctrl | 'e', MenuFlag::Normal, { let s = *s; move |_| s.send(Message::AutoStructure) });

    // Settings
    for name in PRESET_NAMES {
        menu.add(&format!("Settings/Presets/{}", capitalize(name)), Shortcut::None, MenuFlag::Normal, {
            let s = *s;
            move |_| s.send(Message::ApplyPreset(name.to_string()))
        });
    }
    menu.add("Settings/Reset to Defaults", Shortcut::None, MenuFlag::Normal, { let s = *s; move |_| s.send(Message::ResetSettings) });
    menu.add("Settings/Attach Signature...", Shortcut::None, MenuFlag::Normal, {
        let s = *s;
        move |_| {
            if let Some(path) = open_signature_dialog() {
                s.send(Message::SetSignature(path));
            }
        }
    });
    menu.add("Settings/Remove Signature", Shortcut::None, MenuFlag::Normal, { let s = *s; move |_| s.send(Message::ClearSignature) });

    // Document
    menu.add("Document/Generate PDF", Shortcut::Ctrl | Key::Enter, MenuFlag::Normal, { let s = *s; move |_| s.send(Message::Generate) });
    menu.add("Document/Start New", Shortcut::Ctrl | 'n', MenuFlag::Normal, { let s = *s; move |_| s.send(Message::StartNew) });
    menu.add("Document/Download PDF", Shortcut::Ctrl | 's', MenuFlag::Normal, { let s = *s; move |_| s.send(Message::Download) });
    menu.add("Document/Export/JPG", Shortcut::None, MenuFlag::Normal, { let s = *s; move |_| s.send(Message::Export(ExportFormat::Jpg)) });
    menu.add("Document/Export/PNG", Shortcut::None, MenuFlag::Normal, { let s = *s; move |_| s.send(Message::Export(ExportFormat::Png)) });
    menu.add("Document/Open in Browser", Shortcut::None, MenuFlag::Normal, { let s = *s; move |_| s.send(Message::OpenArtifact) });

    // View
    let dm_flag = if initial_dark_mode { MenuFlag::Toggle | MenuFlag::Value } else { MenuFlag::Toggle };
    menu.add("View/Toggle Dark Mode", Shortcut::None, dm_flag, { let s = *s; move |_| s.send(Message::ToggleDarkMode) });
}
