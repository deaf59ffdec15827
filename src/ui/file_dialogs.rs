use std::path::PathBuf;

use fltk::dialog;

pub const TEXT_FILTER: &str = "*.{txt,md,text}";
pub const IMAGE_FILTER: &str = "*.{png,jpg,jpeg}";

fn choose(title: &str, pattern: &str) -> Option<PathBuf> {
    dialog::file_chooser(title, pattern, ".", false)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}

pub fn open_text_dialog() -> Option<PathBuf> {
    choose("Import Text", TEXT_FILTER)
}

pub fn open_signature_dialog() -> Option<PathBuf> {
    choose("Attach Signature", IMAGE_FILTER)
}
