/// The text being rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    text: String,
}

/// Word and character totals shown under the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentStats {
    pub words: usize,
    pub chars: usize,
}

impl DocumentStats {
    pub fn words_label(&self) -> String {
        plural(self.words, "word")
    }

    pub fn chars_label(&self) -> String {
        plural(self.chars, "character")
    }
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{} {}", n, noun)
    } else {
        format!("{} {}s", n, noun)
    }
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the content. Returns false when nothing changed.
    pub fn set_text(&mut self, text: &str) -> bool {
        if self.text == text {
            return false;
        }
        self.text.clear();
        self.text.push_str(text);
        true
    }

    /// Whitespace-only documents count as empty; they are never sent for rendering.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn stats(&self) -> DocumentStats {
        DocumentStats {
            words: self.text.split_whitespace().count(),
            chars: self.text.chars().count(),
        }
    }
}
